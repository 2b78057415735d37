use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::AGENT;
use crate::config::NodeSpec;
use crate::error::{EngineError, Result};
use crate::flow::processor::{input_str, NodeInput, NodeOutput, NodeProcessor, ProcessorServices};
use crate::flow::prompt;
use crate::flow::registry::ProcessorRegistry;
use crate::knowledge::KnowledgeQuery;
use crate::llm::{DynLlmClient, LlmMessage, LlmRequest, ToolCall};
use crate::state::generate_thread_id;
use crate::tools::{ToolConfig, ToolInvocation, ToolRegistry};

/// agent 节点配置
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentNodeConfig {
    /// 模型配置 ID；缺省或无法识别时使用默认配置
    #[serde(default, alias = "provider_id", alias = "modelConfigurationId")]
    pub provider_id: Option<String>,
    #[serde(default, alias = "system_prompt")]
    pub system_prompt: Option<String>,
    #[serde(default, alias = "user_prompt")]
    pub user_prompt: Option<String>,
    #[serde(default, alias = "max_iterations")]
    pub max_iterations: Option<u32>,
    #[serde(default = "default_memory")]
    pub memory: bool,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
    #[serde(default)]
    pub knowledge: Option<KnowledgeQuery>,
}

fn default_memory() -> bool {
    true
}

/// 调用语言模型的 agent 节点
///
/// 模型调用失败、超时、空输出或工具循环超限都在本地捕获，
/// 以 `{status: "error", response}` 返回；拿不到模型客户端则是致命错误。
pub struct AgentNodeProcessor {
    node_id: String,
    config: AgentNodeConfig,
    system_prompt: String,
    tools: ToolRegistry,
    services: ProcessorServices,
}

/// 可恢复的 agent 失败
struct SoftFailure(String);

impl AgentNodeProcessor {
    pub fn new(node_id: impl Into<String>, config: AgentNodeConfig, services: ProcessorServices) -> Result<Self> {
        let tools = ToolRegistry::from_tools(services.tools.generate_tools_from_configs(&config.tools)?);
        let with_knowledge = config
            .knowledge
            .as_ref()
            .is_some_and(|k| !k.selected_bases.is_empty());
        let system_prompt =
            prompt::build_system_prompt(config.system_prompt.as_deref(), with_knowledge, !tools.is_empty());

        Ok(Self {
            node_id: node_id.into(),
            config,
            system_prompt,
            tools,
            services,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn max_iterations(&self) -> u32 {
        self.config
            .max_iterations
            .unwrap_or(self.services.config.default_max_iterations)
            .max(1)
    }

    /// 节点自带知识库配置时检索；否则使用上游知识节点的输出
    async fn knowledge_context(&self, query: &str, input: &NodeInput, warnings: &mut Vec<String>) -> String {
        if let Some(knowledge) = self.config.knowledge.as_ref().filter(|k| !k.selected_bases.is_empty()) {
            let search_query = knowledge.query.as_deref().unwrap_or(query);
            return match self.services.knowledge.search(search_query, knowledge).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(node = %self.node_id, error = %e, "knowledge search failed, continuing without context");
                    warnings.push(format!("knowledge search failed: {e}"));
                    String::new()
                }
            };
        }

        input
            .get("upstream")
            .and_then(Value::as_object)
            .map(|upstream| {
                upstream
                    .values()
                    .filter_map(|output| output.get("knowledge_context").and_then(Value::as_str))
                    .filter(|text| !text.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join("\n\n")
            })
            .unwrap_or_default()
    }

    /// 执行一次工具调用；失败时把错误文本交还给模型
    async fn run_tool(&self, call: &ToolCall) -> String {
        match self
            .tools
            .call(ToolInvocation::new(call.name.clone(), call.arguments.clone()))
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(node = %self.node_id, tool = %call.name, error = %e, "tool call failed");
                format!("Error: {e}")
            }
        }
    }

    /// 工具调用循环：模型返回工具调用时执行并回填结果，直到得到最终文本
    async fn converse(
        &self,
        client: &DynLlmClient,
        history: Vec<LlmMessage>,
        message: String,
    ) -> std::result::Result<String, SoftFailure> {
        let mut request = LlmRequest {
            system: Some(self.system_prompt.clone()),
            messages: history,
            tools: self.tools.specs(),
            temperature: self
                .config
                .temperature
                .unwrap_or(self.services.config.default_temperature),
            metadata: None,
        };
        request.messages.push(LlmMessage::user(message));

        let timeout = self.services.config.model_timeout();
        let max_iterations = self.max_iterations();
        for iteration in 0..max_iterations {
            let response = tokio::time::timeout(timeout, client.complete(request.clone()))
                .await
                .map_err(|_| SoftFailure(format!("model call timed out after {}s", timeout.as_secs())))?
                .map_err(|e| SoftFailure(e.to_string()))?;

            if response.tool_calls.is_empty() {
                let content = response.content.trim();
                if content.is_empty() {
                    return Err(SoftFailure("model returned an empty response".to_string()));
                }
                return Ok(content.to_string());
            }

            debug!(
                node = %self.node_id,
                iteration,
                calls = response.tool_calls.len(),
                "model requested tool calls"
            );
            let calls = response.tool_calls.clone();
            request
                .messages
                .push(LlmMessage::assistant_tool_calls(response.content, response.tool_calls));
            // 同一轮的工具调用并发执行，结果按调用顺序回填
            let results = future::join_all(calls.iter().map(|call| self.run_tool(call))).await;
            for (call, result) in calls.into_iter().zip(results) {
                request.messages.push(LlmMessage::tool_result(call.id, result));
            }
        }

        Err(SoftFailure(format!(
            "exceeded maximum of {max_iterations} tool iterations"
        )))
    }
}

#[async_trait]
impl NodeProcessor for AgentNodeProcessor {
    fn kind(&self) -> &'static str {
        AGENT
    }

    #[instrument(skip(self, input), fields(node = %self.node_id))]
    async fn process(&self, input: NodeInput) -> Result<NodeOutput> {
        let query = input_str(&input, "query")
            .ok_or_else(|| EngineError::configuration("Query is required"))?
            .to_string();
        let thread_id = input_str(&input, "thread_id")
            .map(str::to_string)
            .unwrap_or_else(generate_thread_id);
        let mut warnings = Vec::new();

        let context = self.knowledge_context(&query, &input, &mut warnings).await;
        let augmented = prompt::augment_query(&query, &context, self.services.config.knowledge_context_limit);
        let rag_used = augmented.is_some();
        let message = prompt::apply_user_prompt(
            self.config.user_prompt.as_deref(),
            augmented.as_deref().unwrap_or(&query),
        );

        let client = self
            .services
            .models
            .get_model(self.config.provider_id.as_deref().unwrap_or_default())?;

        let history = if self.config.memory {
            match self.services.memory.history(&thread_id).await {
                Ok(history) => history,
                Err(e) => {
                    warn!(node = %self.node_id, error = %e, "failed to load conversation history");
                    warnings.push(format!("conversation history unavailable: {e}"));
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let response = match self.converse(&client, history, message).await {
            Ok(response) => response,
            Err(SoftFailure(reason)) => {
                warn!(node = %self.node_id, %reason, "agent failed to run query");
                return Ok(to_output(json!({
                    "status": "error",
                    "response": format!("Agent failed to run query: {reason}"),
                    "thread_id": thread_id,
                    "warnings": warnings,
                })));
            }
        };

        if self.config.memory {
            if let Err(e) = self.services.memory.record_turn(&thread_id, &query, &response).await {
                warn!(node = %self.node_id, error = %e, "failed to persist conversation turn");
                warnings.push(format!("conversation turn not persisted: {e}"));
            }
        }

        Ok(to_output(json!({
            "status": "success",
            "response": response,
            "thread_id": thread_id,
            "rag_used": rag_used,
            "warnings": warnings,
        })))
    }
}

fn to_output(value: Value) -> NodeOutput {
    match value {
        Value::Object(map) => map,
        _ => NodeOutput::new(),
    }
}

pub(super) fn register(registry: &mut ProcessorRegistry) {
    registry.register(
        AGENT,
        Arc::new(|spec: &NodeSpec, services: &ProcessorServices| -> Result<Arc<dyn NodeProcessor>> {
            let config: AgentNodeConfig = serde_json::from_value(Value::Object(spec.config.clone()))
                .map_err(|e| {
                    EngineError::configuration(format!("invalid config for agent node `{}`: {e}", spec.id))
                })?;
            Ok(Arc::new(AgentNodeProcessor::new(
                spec.id.clone(),
                config,
                services.clone(),
            )?))
        }),
    );
    registry.alias("agentNode", AGENT);
}
