use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 工具配置记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ToolKind,
    #[serde(default)]
    pub api_config: Option<ApiConfig>,
    #[serde(default)]
    pub function_config: Option<FunctionConfig>,
    #[serde(default = "empty_schema")]
    pub parameters_schema: Value,
}

fn empty_schema() -> Value {
    Value::Object(Map::new())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Api,
    Function,
}

/// HTTP 工具配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub endpoint: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query_params: Map<String, Value>,
    #[serde(default)]
    pub body: Map<String, Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// 函数工具配置：`function` 选择已注册的实现，其余字段原样交给实现
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub function: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ToolConfig {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        function: impl Into<String>,
        options: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: ToolKind::Function,
            api_config: None,
            function_config: Some(FunctionConfig {
                function: function.into(),
                options: match options {
                    Value::Object(map) => map,
                    _ => Map::new(),
                },
            }),
            parameters_schema: empty_schema(),
        }
    }

    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.parameters_schema = schema;
        self
    }

    /// 规范化后的 JSON Schema：空 schema 视为无参数对象
    pub fn parameters(&self) -> Value {
        match &self.parameters_schema {
            Value::Object(map) if !map.is_empty() => self.parameters_schema.clone(),
            _ => serde_json::json!({ "type": "object", "properties": {} }),
        }
    }
}
