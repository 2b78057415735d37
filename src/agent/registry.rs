use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info};

use super::model::AgentRecord;
use super::repository::AgentRepository;
use crate::config::WorkflowDefinition;
use crate::error::{EngineError, Result};
use crate::flow::{CompiledPlan, WorkflowBuilder};

/// 已编译、可直接运行的 agent
#[derive(Clone, Debug)]
pub struct RegistryItem {
    pub agent: AgentRecord,
    pub workflow: WorkflowDefinition,
    pub plan: CompiledPlan,
}

/// agent 注册表：agent ID -> 编译后的执行计划
///
/// 编译在锁外完成，写锁只覆盖一次插入，调用方看不到中间状态。
pub struct AgentRegistry {
    builder: WorkflowBuilder,
    table: RwLock<HashMap<String, Arc<RegistryItem>>>,
    ready: AtomicBool,
}

impl AgentRegistry {
    pub fn new(builder: WorkflowBuilder) -> Self {
        Self {
            builder,
            table: RwLock::new(HashMap::new()),
            ready: AtomicBool::new(false),
        }
    }

    pub fn builder(&self) -> &WorkflowBuilder {
        &self.builder
    }

    /// 启动时批量加载所有活跃 agent
    ///
    /// 单个 agent 编译失败只记录日志并跳过；读取持久化失败时返回错误。
    pub async fn initialize(&self, repository: &dyn AgentRepository) -> Result<usize> {
        let records = repository.list_active().await?;
        let total = records.len();
        let mut registered = 0;
        for record in records {
            let agent_id = record.id.clone();
            match self.register_agent(&agent_id, record) {
                Ok(_) => registered += 1,
                Err(e) => error!(agent = %agent_id, error = %e, "failed to register agent"),
            }
        }

        self.ready.store(true, Ordering::Release);
        info!(registered, total, "agent registry initialized");
        Ok(registered)
    }

    /// 初始化是否已完成
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// 编译 agent 的工作流并写入注册表，覆盖同 ID 的旧条目
    pub fn register_agent(&self, agent_id: &str, agent: AgentRecord) -> Result<Arc<RegistryItem>> {
        let workflow = agent
            .workflow
            .as_ref()
            .map(|w| w.definition.clone())
            .ok_or_else(|| {
                EngineError::configuration(format!("agent `{agent_id}` has no workflow"))
            })?;
        let plan = self.builder.compile(&workflow)?;

        let item = Arc::new(RegistryItem {
            agent,
            workflow,
            plan,
        });
        self.table
            .write()
            .insert(agent_id.to_string(), Arc::clone(&item));
        info!(agent = %agent_id, order = ?item.plan.order(), "registered agent");
        Ok(item)
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<Arc<RegistryItem>> {
        self.table.read().get(agent_id).map(Arc::clone)
    }

    pub fn is_initialized(&self, agent_id: &str) -> bool {
        self.table.read().contains_key(agent_id)
    }

    /// 移除 agent；返回之前是否存在
    pub fn unregister_agent(&self, agent_id: &str) -> bool {
        let removed = self.table.write().remove(agent_id).is_some();
        if removed {
            info!(agent = %agent_id, "unregistered agent");
        }
        removed
    }

    pub fn unregister_all(&self) {
        let count = {
            let mut table = self.table.write();
            let count = table.len();
            table.clear();
            count
        };
        info!(count, "unregistered all agents");
    }

    pub fn agent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.table.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}
