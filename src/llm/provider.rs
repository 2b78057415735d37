use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::credentials::SecretCipher;
use crate::config::EnvConfig;
use crate::error::{EngineError, Result};

/// 模型配置，来自外部持久化层
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfiguration {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "llm_model_provider")]
    pub provider: String,
    #[serde(alias = "llm_model")]
    pub model: String,
    #[serde(default)]
    pub connection_data: ConnectionData,
    #[serde(default, deserialize_with = "crate::utils::de::bool_or_int")]
    pub is_default: bool,
}

/// 连接参数；`api_key` 为密文
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConnectionData {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub masked_api_key: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for ConnectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionData")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("masked_api_key", &self.masked_api_key)
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelConfiguration {
    pub fn new(
        id: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            provider: provider.into(),
            model: model.into(),
            connection_data: ConnectionData::default(),
            is_default: false,
        }
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn with_api_key(mut self, ciphertext: impl Into<String>) -> Self {
        self.connection_data.api_key = Some(ciphertext.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.connection_data.base_url = Some(base_url.into());
        self
    }
}

/// 提供商类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Echo,
    OpenAi,
    Anthropic,
    OpenRouter,
    Ollama,
    /// 任意兼容 OpenAI API 的服务
    Generic,
}

impl ProviderKind {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "echo" | "local" => ProviderKind::Echo,
            "openai" | "chatgpt" => ProviderKind::OpenAi,
            "anthropic" | "claude" => ProviderKind::Anthropic,
            "openrouter" => ProviderKind::OpenRouter,
            "ollama" => ProviderKind::Ollama,
            _ => ProviderKind::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Echo => "echo",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Generic => "generic",
        }
    }

    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
            ProviderKind::Anthropic => Some("https://api.anthropic.com/v1"),
            ProviderKind::OpenRouter => Some("https://openrouter.ai/api/v1"),
            ProviderKind::Ollama => Some("http://localhost:11434/v1"),
            ProviderKind::Echo | ProviderKind::Generic => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Echo | ProviderKind::Ollama)
    }
}

/// 解密并整理后的客户端构造参数
#[derive(Clone)]
pub struct ProviderSetup {
    pub configuration_id: String,
    pub provider: ProviderKind,
    pub model: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    /// 额外请求头，例如 OpenAI 的组织 ID
    pub headers: Vec<(String, String)>,
    pub options: Map<String, Value>,
}

impl fmt::Debug for ProviderSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSetup")
            .field("configuration_id", &self.configuration_id)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderSetup {
    /// 丢弃掩码密钥、解密 API key 并按提供商补全端点与请求头
    pub fn prepare(configuration: &ModelConfiguration, cipher: &dyn SecretCipher) -> Result<Self> {
        let provider = ProviderKind::parse(&configuration.provider);
        let data = &configuration.connection_data;

        let api_key = match data.api_key.as_deref().filter(|k| !k.is_empty()) {
            // 解密后的值仍可以是 `${VAR}` 形式的环境变量引用
            Some(ciphertext) => Some(
                EnvConfig::resolve_secret(&cipher.decrypt(ciphertext)?)
                    .map_err(|e| EngineError::provider(e.to_string()))?,
            ),
            None if provider.requires_api_key() => {
                return Err(EngineError::provider(format!(
                    "model configuration `{}` has no api key for provider `{}`",
                    configuration.id,
                    provider.as_str()
                )))
            }
            None => None,
        };

        let endpoint = data
            .base_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| provider.default_endpoint().map(str::to_string));
        if endpoint.is_none() && provider != ProviderKind::Echo {
            return Err(EngineError::provider(format!(
                "model configuration `{}` needs a base_url for provider `{}`",
                configuration.id, configuration.provider
            )));
        }

        let mut headers = Vec::new();
        match provider {
            ProviderKind::OpenAi => {
                if let Some(org) = data.organization.as_ref().filter(|o| !o.is_empty()) {
                    headers.push(("OpenAI-Organization".to_string(), org.clone()));
                }
            }
            ProviderKind::Anthropic => {
                headers.push(("anthropic-version".to_string(), "2023-06-01".to_string()));
            }
            _ => {}
        }

        Ok(Self {
            configuration_id: configuration.id.clone(),
            provider,
            model: configuration.model.clone(),
            endpoint,
            api_key,
            headers,
            options: data.extra.clone(),
        })
    }
}
