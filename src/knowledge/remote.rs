use async_trait::async_trait;
use serde_json::{json, Value};

use super::{KnowledgeQuery, KnowledgeSearch};
use crate::error::{EngineError, Result};

/// 外部检索服务客户端
///
/// 请求体 `{ "kb_ids", "query", "limit", "force" }`，响应 `{ "results": [{ "content" }] }`。
pub struct HttpKnowledgeSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpKnowledgeSearch {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[async_trait]
impl KnowledgeSearch for HttpKnowledgeSearch {
    async fn search(&self, query: &str, config: &KnowledgeQuery) -> Result<String> {
        let body = json!({
            "kb_ids": config.selected_bases,
            "query": query,
            "limit": config.limit,
            "force": config.force,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| EngineError::provider(format!("knowledge search request error: {e}")))?;
        if !response.status().is_success() {
            return Err(EngineError::provider(format!(
                "knowledge search failed with status {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| EngineError::provider(format!("knowledge search parse error: {e}")))?;
        let passages: Vec<&str> = payload["results"]
            .as_array()
            .map(|results| results.iter().filter_map(|r| r["content"].as_str()).collect())
            .unwrap_or_default();
        Ok(passages.join("\n\n"))
    }
}
