use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::provider::ModelConfiguration;
use crate::error::{EngineError, Result};

/// 读取全部模型配置的持久化接口
#[async_trait]
pub trait ModelConfigSource: Send + Sync {
    async fn load_all(&self) -> Result<Vec<ModelConfiguration>>;
}

/// 内存中的配置集合，可在运行时替换
#[derive(Default)]
pub struct StaticModelConfigs {
    configurations: RwLock<Vec<ModelConfiguration>>,
}

impl StaticModelConfigs {
    pub fn new(configurations: Vec<ModelConfiguration>) -> Self {
        Self {
            configurations: RwLock::new(configurations),
        }
    }

    /// 从 JSON 数组文件加载
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        let configurations: Vec<ModelConfiguration> = serde_json::from_str(&raw)?;
        Ok(Self::new(configurations))
    }

    pub fn replace(&self, configurations: Vec<ModelConfiguration>) {
        *self.configurations.write() = configurations;
    }

    pub fn upsert(&self, configuration: ModelConfiguration) {
        let mut guard = self.configurations.write();
        match guard.iter_mut().find(|c| c.id == configuration.id) {
            Some(existing) => *existing = configuration,
            None => guard.push(configuration),
        }
    }
}

#[async_trait]
impl ModelConfigSource for StaticModelConfigs {
    async fn load_all(&self) -> Result<Vec<ModelConfiguration>> {
        Ok(self.configurations.read().clone())
    }
}
