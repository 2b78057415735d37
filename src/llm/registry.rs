use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{error, info, instrument};

use super::client::DynLlmClient;
use super::credentials::SecretCipher;
use super::factory::ClientFactory;
use super::provider::{ModelConfiguration, ProviderSetup};
use super::source::ModelConfigSource;
use crate::error::{EngineError, Result};

type ClientCache = Mutex<HashMap<String, DynLlmClient>>;

/// 模型实例注册表
///
/// 按配置 ID 缓存已构造的客户端。`reload` 会整体替换配置快照和客户端缓存，
/// 从不原地修改：持有旧客户端的调用方可以继续安全使用它，读者只会看到
/// 旧的完整缓存或新的空缓存。
pub struct ModelRegistry {
    source: Arc<dyn ModelConfigSource>,
    cipher: Arc<dyn SecretCipher>,
    factory: Arc<dyn ClientFactory>,
    configurations: RwLock<Arc<Vec<ModelConfiguration>>>,
    clients: RwLock<Arc<ClientCache>>,
}

impl ModelRegistry {
    pub fn new(
        source: Arc<dyn ModelConfigSource>,
        cipher: Arc<dyn SecretCipher>,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self {
            source,
            cipher,
            factory,
            configurations: RwLock::new(Arc::new(Vec::new())),
            clients: RwLock::new(Arc::new(ClientCache::default())),
        }
    }

    /// 重新读取全部配置并丢弃整个客户端缓存
    pub async fn reload(&self) -> Result<Vec<ModelConfiguration>> {
        let configurations = self.source.load_all().await?;
        let ids: Vec<&str> = configurations.iter().map(|c| c.id.as_str()).collect();
        info!(count = configurations.len(), ids = ?ids, "reloaded model configurations");

        *self.configurations.write() = Arc::new(configurations.clone());
        *self.clients.write() = Arc::new(ClientCache::default());
        Ok(configurations)
    }

    /// 当前缓存的配置快照
    pub fn configurations(&self) -> Arc<Vec<ModelConfiguration>> {
        self.configurations.read().clone()
    }

    /// 按 ID 查找配置
    ///
    /// 未识别的 ID 回退到 `is_default` 配置；没有默认配置时回退到第一个配置。
    pub fn get_configuration(&self, configuration_id: &str) -> Result<ModelConfiguration> {
        let configurations = self.configurations();
        configurations
            .iter()
            .find(|c| c.id == configuration_id)
            .or_else(|| configurations.iter().find(|c| c.is_default))
            .or_else(|| configurations.first())
            .cloned()
            .ok_or_else(|| {
                EngineError::not_found(format!(
                    "no model configuration available for `{configuration_id}`"
                ))
            })
    }

    /// 获取（必要时构造并缓存）模型客户端
    ///
    /// 缓存键是解析后的配置 ID，因此回退到默认配置的请求共享同一个客户端。
    /// 构造失败不会被缓存。
    #[instrument(skip(self))]
    pub fn get_model(&self, configuration_id: &str) -> Result<DynLlmClient> {
        let configuration = self.get_configuration(configuration_id)?;
        // 捕获当前缓存引用；并发 reload 时写入的是旧缓存
        let cache = self.clients.read().clone();
        let mut clients = cache.lock();
        if let Some(client) = clients.get(&configuration.id) {
            return Ok(Arc::clone(client));
        }

        let client = ProviderSetup::prepare(&configuration, self.cipher.as_ref())
            .and_then(|setup| self.factory.build(&setup))
            .map_err(|e| {
                error!(configuration = %configuration.id, error = %e, "failed to initialize model client");
                match e {
                    EngineError::Provider(_) => e,
                    other => EngineError::provider(other.to_string()),
                }
            })?;

        clients.insert(configuration.id.clone(), Arc::clone(&client));
        info!(
            configuration = %configuration.id,
            provider = %configuration.provider,
            model = %configuration.model,
            "created model client"
        );
        Ok(client)
    }

    /// 当前缓存中的客户端数量
    pub fn cached_clients(&self) -> usize {
        self.clients.read().lock().len()
    }

    /// 清空客户端缓存（保留配置快照）
    pub fn clear(&self) {
        *self.clients.write() = Arc::new(ClientCache::default());
    }
}
