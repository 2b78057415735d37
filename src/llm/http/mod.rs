//! HTTP 客户端实现模块
//!
//! `GenericHttpClient` 面向所有兼容 OpenAI `chat/completions` 协议的服务
//! （OpenAI、Anthropic 兼容端点、OpenRouter、Ollama、vLLM 等）。
//! 端点、密钥和请求头全部来自 `ProviderSetup`，不做硬编码。

#[cfg(feature = "openai-client")]
pub mod generic;

#[cfg(feature = "openai-client")]
pub use generic::GenericHttpClient;
