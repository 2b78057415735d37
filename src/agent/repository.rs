use async_trait::async_trait;
use parking_lot::RwLock;

use super::model::AgentRecord;
use crate::error::Result;

/// agent 持久化读取接口
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// 所有活跃 agent，附带工作流和运营者信息
    async fn list_active(&self) -> Result<Vec<AgentRecord>>;
}

/// 内存实现，用于本地运行和测试
#[derive(Default)]
pub struct InMemoryAgentRepository {
    records: RwLock<Vec<AgentRecord>>,
}

impl InMemoryAgentRepository {
    pub fn new(records: Vec<AgentRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// 插入或替换同 ID 记录
    pub fn upsert(&self, record: AgentRecord) {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    pub fn remove(&self, agent_id: &str) {
        self.records.write().retain(|r| r.id != agent_id);
    }
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn list_active(&self) -> Result<Vec<AgentRecord>> {
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }
}
