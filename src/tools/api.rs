use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;

use super::config::{ApiConfig, ToolConfig};
use super::tool::{Tool, ToolInvocation};
use crate::error::{EngineError, Result};
use crate::llm::ToolSpec;

/// 按 `api_config` 发起 HTTP 请求的工具
///
/// 调用参数在 GET/DELETE 时并入查询参数，其余方法并入请求体。
pub(crate) struct ApiTool {
    spec: ToolSpec,
    config: ApiConfig,
    method: Method,
    client: reqwest::Client,
}

impl ApiTool {
    pub(crate) fn new(tool: &ToolConfig, config: ApiConfig) -> Result<Self> {
        let method = Method::from_bytes(config.method.to_uppercase().as_bytes()).map_err(|_| {
            EngineError::configuration(format!(
                "tool `{}` has invalid HTTP method `{}`",
                tool.name, config.method
            ))
        })?;
        Ok(Self {
            spec: ToolSpec {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters(),
            },
            config,
            method,
            client: reqwest::Client::new(),
        })
    }

    fn merged(base: &Map<String, Value>, arguments: &Value) -> Map<String, Value> {
        let mut merged = base.clone();
        if let Some(arguments) = arguments.as_object() {
            merged.extend(arguments.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }
}

#[async_trait]
impl Tool for ApiTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn spec(&self) -> ToolSpec {
        self.spec.clone()
    }

    async fn call(&self, invocation: ToolInvocation) -> Result<String> {
        let mut request = self.client.request(self.method.clone(), &self.config.endpoint);
        for (name, value) in &self.config.headers {
            request = request.header(name, value);
        }

        if matches!(self.method, Method::GET | Method::DELETE) {
            let query: Vec<(String, String)> = Self::merged(&self.config.query_params, &invocation.input)
                .into_iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, v)
                })
                .collect();
            request = request.query(&query);
        } else {
            if !self.config.query_params.is_empty() {
                request = request.query(&self.config.query_params);
            }
            request = request.json(&Self::merged(&self.config.body, &invocation.input));
        }

        debug!(tool = %self.spec.name, endpoint = %self.config.endpoint, "calling api tool");
        let response = request
            .send()
            .await
            .map_err(|e| EngineError::Tool(format!("{} request error: {e}", self.spec.name)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::Tool(format!("{} read error: {e}", self.spec.name)))?;
        if !status.is_success() {
            return Err(EngineError::Tool(format!(
                "{} returned status {status}: {text}",
                self.spec.name
            )));
        }
        Ok(text)
    }
}
