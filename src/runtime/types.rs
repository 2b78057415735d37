use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, Result};

/// 执行请求
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RunRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        if let Value::Object(map) = metadata {
            self.metadata = map;
        }
        self
    }

    /// 缺少必填字段；HTTP 层映射为 400
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(EngineError::configuration("Query is required"));
        }
        Ok(())
    }
}

/// 执行结果
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunResult {
    Success {
        response: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        /// 降级处理的节点失败
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl RunResult {
    pub fn error(message: impl Into<String>) -> Self {
        RunResult::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success { .. })
    }

    pub fn response(&self) -> Option<&str> {
        match self {
            RunResult::Success { response, .. } => Some(response),
            RunResult::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            RunResult::Error { message } => Some(message),
            RunResult::Success { .. } => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            RunResult::Success { warnings, .. } => warnings,
            RunResult::Error { .. } => &[],
        }
    }
}

impl From<&EngineError> for RunResult {
    fn from(err: &EngineError) -> Self {
        RunResult::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_serializes_with_status_tag() {
        let success = RunResult::Success {
            response: "hi".into(),
            agent_id: Some("a1".into()),
            thread_id: None,
            warnings: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&success).unwrap(),
            json!({ "status": "success", "response": "hi", "agent_id": "a1" })
        );
        assert_eq!(
            serde_json::to_value(RunResult::error("boom")).unwrap(),
            json!({ "status": "error", "message": "boom" })
        );
    }

    #[test]
    fn blank_message_fails_validation() {
        assert!(RunRequest::new("  ").validate().unwrap_err().is_configuration());
        let request: RunRequest =
            serde_json::from_value(json!({ "message": "hello", "metadata": { "thread_id": "t" } })).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.metadata["thread_id"], "t");
    }
}
