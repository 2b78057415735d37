use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use crate::error::{EngineError, Result};
use crate::llm::client::LlmClient;
use crate::llm::provider::ProviderSetup;
use crate::llm::types::{LlmMessage, LlmRequest, LlmResponse, MessageRole, ToolCall};

#[derive(Clone)]
pub struct GenericHttpClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    headers: Vec<(String, String)>,
}

impl GenericHttpClient {
    /// 连接池复用连接，并设置连接与请求超时
    fn create_client() -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| EngineError::provider(format!("failed to build HTTP client: {e}")))
    }

    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: Self::create_client()?,
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            headers: Vec::new(),
        })
    }

    pub fn from_setup(setup: &ProviderSetup) -> Result<Self> {
        let endpoint = setup.endpoint.clone().ok_or_else(|| {
            EngineError::provider(format!(
                "no endpoint resolved for model configuration `{}`",
                setup.configuration_id
            ))
        })?;
        let mut client = Self::new(endpoint, setup.api_key.clone(), setup.model.clone())?;
        client.headers = setup.headers.clone();
        Ok(client)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    fn encode_message(message: &LlmMessage) -> Value {
        let mut value = json!({
            "role": message.role.as_str(),
            "content": message.content,
        });
        if !message.tool_calls.is_empty() {
            value["tool_calls"] = Value::Array(
                message
                    .tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            }
                        })
                    })
                    .collect(),
            );
        }
        if let Some(id) = &message.tool_call_id {
            value["tool_call_id"] = Value::String(id.clone());
        }
        value
    }

    fn build_body(&self, request: &LlmRequest) -> Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(json!({ "role": MessageRole::System.as_str(), "content": system }));
        }
        messages.extend(request.messages.iter().map(Self::encode_message));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
        });
        if !request.tools.is_empty() {
            body["tools"] = Value::Array(
                request
                    .tools
                    .iter()
                    .map(|tool| {
                        json!({
                            "type": "function",
                            "function": {
                                "name": tool.name,
                                "description": tool.description,
                                "parameters": tool.parameters,
                            }
                        })
                    })
                    .collect(),
            );
        }
        body
    }

    fn parse_tool_calls(message: &Value) -> Vec<ToolCall> {
        message["tool_calls"]
            .as_array()
            .map(|calls| {
                calls
                    .iter()
                    .filter_map(|call| {
                        let function = &call["function"];
                        let name = function["name"].as_str()?.to_string();
                        let arguments = match &function["arguments"] {
                            Value::String(raw) => {
                                serde_json::from_str(raw).unwrap_or(Value::String(raw.clone()))
                            }
                            other => other.clone(),
                        };
                        Some(ToolCall {
                            id: call["id"].as_str().unwrap_or(&name).to_string(),
                            name,
                            arguments,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for GenericHttpClient {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let body = self.build_body(&request);

        let mut builder = self.client.post(self.completions_url()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| EngineError::provider(format!("model request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EngineError::provider(format!(
                "model request failed with status {status}: {detail}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| EngineError::provider(format!("malformed model response: {e}")))?;
        let message = payload["choices"]
            .get(0)
            .map(|choice| &choice["message"])
            .ok_or_else(|| EngineError::provider("model response has no choices"))?;

        Ok(LlmResponse {
            content: message["content"].as_str().unwrap_or_default().to_string(),
            tool_calls: Self::parse_tool_calls(message),
            metadata: payload.get("usage").cloned(),
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
