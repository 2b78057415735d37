use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{error, info, instrument, warn};

use super::executor::execute_plan;
use super::types::{RunRequest, RunResult};
use crate::agent::AgentRegistry;
use crate::config::WorkflowDefinition;
use crate::error::{EngineError, Result};
use crate::flow::CompiledPlan;
use crate::state::ExecutionContext;

/// 工作流执行入口
#[derive(Clone)]
pub struct WorkflowRunner {
    agents: Arc<AgentRegistry>,
}

impl WorkflowRunner {
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self { agents }
    }

    /// 运行已注册的 agent
    ///
    /// agent 不存在或未激活时返回 `NotFound`；执行中的致命错误转为 `RunResult::Error`。
    #[instrument(skip(self, query, metadata))]
    pub async fn run(
        &self,
        agent_id: &str,
        query: &str,
        metadata: Map<String, Value>,
    ) -> Result<RunResult> {
        let item = self
            .agents
            .get_agent(agent_id)
            .filter(|item| item.agent.is_active)
            .ok_or_else(|| EngineError::not_found(format!("agent `{agent_id}` not found")))?;

        Ok(self.execute(&item.plan, query, metadata, Some(agent_id)).await)
    }

    /// 校验请求后运行已注册的 agent
    pub async fn handle(&self, agent_id: &str, request: RunRequest) -> Result<RunResult> {
        request.validate()?;
        self.run(agent_id, &request.message, request.metadata).await
    }

    /// 临时编译并运行定义，不经过注册表
    #[instrument(skip_all, fields(nodes = definition.nodes.len()))]
    pub async fn run_from_definition(
        &self,
        definition: &WorkflowDefinition,
        query: &str,
        metadata: Map<String, Value>,
    ) -> RunResult {
        match self.agents.builder().compile(definition) {
            Ok(plan) => self.execute(&plan, query, metadata, None).await,
            Err(e) => {
                error!(error = %e, "failed to compile workflow");
                RunResult::from(&e)
            }
        }
    }

    async fn execute(
        &self,
        plan: &CompiledPlan,
        query: &str,
        metadata: Map<String, Value>,
        agent_id: Option<&str>,
    ) -> RunResult {
        let ctx = ExecutionContext::new(query.trim(), metadata);
        if let Err(e) = execute_plan(plan, &ctx).await {
            return RunResult::from(&e);
        }

        let warnings = ctx.warnings();
        if !warnings.is_empty() {
            warn!(?warnings, "workflow completed with degraded nodes");
        }
        info!(nodes = plan.len(), thread_id = %ctx.thread_id(), "workflow completed");

        RunResult::Success {
            response: ctx.response().unwrap_or_default(),
            agent_id: agent_id.map(str::to_string),
            thread_id: Some(ctx.thread_id()),
            warnings,
        }
    }
}
