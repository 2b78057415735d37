use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::llm::ToolSpec;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ToolInvocation {
    pub fn new<T: Into<String>>(name: T, input: Value) -> Self {
        Self {
            name: name.into(),
            input,
            metadata: None,
        }
    }
}

/// 可被模型调用的工具
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// 发送给模型的工具描述
    fn spec(&self) -> ToolSpec;

    async fn call(&self, invocation: ToolInvocation) -> Result<String>;
}
