use std::sync::Arc;

use super::client::DynLlmClient;
use super::echo::LocalEchoClient;
use super::provider::{ProviderKind, ProviderSetup};
use crate::error::Result;

#[cfg(not(feature = "openai-client"))]
use crate::error::EngineError;

/// 根据已解密的配置构造模型客户端
pub trait ClientFactory: Send + Sync {
    fn build(&self, setup: &ProviderSetup) -> Result<DynLlmClient>;
}

/// 默认工厂：`echo` 使用本地回显，其余提供商统一走 `GenericHttpClient`
#[derive(Default, Clone)]
pub struct DefaultClientFactory;

#[cfg(feature = "openai-client")]
impl ClientFactory for DefaultClientFactory {
    fn build(&self, setup: &ProviderSetup) -> Result<DynLlmClient> {
        match setup.provider {
            ProviderKind::Echo => Ok(Arc::new(LocalEchoClient)),
            _ => Ok(Arc::new(super::http::GenericHttpClient::from_setup(setup)?)),
        }
    }
}

#[cfg(not(feature = "openai-client"))]
impl ClientFactory for DefaultClientFactory {
    fn build(&self, setup: &ProviderSetup) -> Result<DynLlmClient> {
        match setup.provider {
            ProviderKind::Echo => Ok(Arc::new(LocalEchoClient)),
            other => Err(EngineError::provider(format!(
                "provider `{}` requires the `openai-client` feature",
                other.as_str()
            ))),
        }
    }
}
