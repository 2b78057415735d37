use async_trait::async_trait;

use super::client::LlmClient;
use super::types::{LlmRequest, LlmResponse};
use crate::error::Result;

/// 本地回显客户端，用于测试和离线运行
#[derive(Default, Clone)]
pub struct LocalEchoClient;

#[async_trait]
impl LlmClient for LocalEchoClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let user = request.last_user_message().unwrap_or_default();
        Ok(LlmResponse::text(format!("[Echo] {user}")))
    }

    fn model(&self) -> &str {
        "echo"
    }
}
