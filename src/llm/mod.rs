pub mod client;
pub mod credentials;
pub mod echo;
pub mod factory;
pub mod http;
pub mod provider;
pub mod registry;
pub mod source;
pub mod types;

pub use client::{DynLlmClient, LlmClient};
pub use credentials::{Base64Cipher, PlaintextCipher, SecretCipher};
pub use echo::LocalEchoClient;
pub use factory::{ClientFactory, DefaultClientFactory};
#[cfg(feature = "openai-client")]
pub use http::GenericHttpClient;
pub use provider::{ConnectionData, ModelConfiguration, ProviderKind, ProviderSetup};
pub use registry::ModelRegistry;
pub use source::{ModelConfigSource, StaticModelConfigs};
pub use types::{LlmMessage, LlmRequest, LlmResponse, MessageRole, ToolCall, ToolSpec};
