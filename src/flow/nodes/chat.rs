use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{CHAT_INPUT, CHAT_OUTPUT};
use crate::config::NodeSpec;
use crate::error::{EngineError, Result};
use crate::flow::processor::{input_str, NodeInput, NodeOutput, NodeProcessor, ProcessorServices};
use crate::flow::registry::ProcessorRegistry;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatInputConfig {
    /// 声明的输入字段：`{ <field>: { type, required, ... } }`
    #[serde(default)]
    input_schema: Map<String, Value>,
}

/// 聊天输入节点：校验查询和声明的输入字段
pub struct ChatInputProcessor {
    fields: Vec<String>,
    required: Vec<String>,
}

impl ChatInputProcessor {
    fn new(config: ChatInputConfig) -> Self {
        let required = config
            .input_schema
            .iter()
            .filter(|(_, field)| field.get("required").and_then(Value::as_bool) == Some(true))
            .map(|(key, _)| key.clone())
            .collect();
        Self {
            fields: config.input_schema.keys().cloned().collect(),
            required,
        }
    }
}

/// 按 `a.b.c` 路径读取元数据
fn lookup<'a>(metadata: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = metadata.get(parts.next()?)?;
    parts.try_fold(first, |value, part| value.get(part))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[async_trait]
impl NodeProcessor for ChatInputProcessor {
    fn kind(&self) -> &'static str {
        CHAT_INPUT
    }

    async fn process(&self, input: NodeInput) -> Result<NodeOutput> {
        let query = input_str(&input, "query").ok_or_else(|| EngineError::configuration("Query is required"))?;
        let empty = Map::new();
        let metadata = input.get("metadata").and_then(Value::as_object).unwrap_or(&empty);

        if let Some(missing) = self
            .required
            .iter()
            .find(|key| lookup(metadata, key).map_or(true, is_blank))
        {
            return Err(EngineError::configuration(format!("missing required input `{missing}`")));
        }

        let mut output = NodeOutput::new();
        output.insert("status".into(), Value::from("success"));
        output.insert("query".into(), Value::from(query));
        let inputs: Map<String, Value> = self
            .fields
            .iter()
            .filter_map(|key| Some((key.clone(), lookup(metadata, key)?.clone())))
            .collect();
        output.insert("inputs".into(), Value::Object(inputs));
        Ok(output)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ChatOutputConfig {
    #[serde(default)]
    template: Option<String>,
}

/// 聊天输出节点：确定最终响应，可选 `{response}` / `{query}` 模板
pub struct ChatOutputProcessor {
    template: Option<String>,
}

#[async_trait]
impl NodeProcessor for ChatOutputProcessor {
    fn kind(&self) -> &'static str {
        CHAT_OUTPUT
    }

    async fn process(&self, input: NodeInput) -> Result<NodeOutput> {
        let response = input.get("response").and_then(Value::as_str).unwrap_or_default();
        let query = input.get("query").and_then(Value::as_str).unwrap_or_default();
        let rendered = match &self.template {
            Some(template) => template.replace("{response}", response).replace("{query}", query),
            None => response.to_string(),
        };

        let mut output = NodeOutput::new();
        output.insert("status".into(), Value::from("success"));
        output.insert("response".into(), Value::from(rendered));
        Ok(output)
    }
}

fn parse<T: for<'de> Deserialize<'de>>(spec: &NodeSpec) -> Result<T> {
    serde_json::from_value(Value::Object(spec.config.clone())).map_err(|e| {
        EngineError::configuration(format!("invalid config for node `{}`: {e}", spec.id))
    })
}

pub(super) fn register(registry: &mut ProcessorRegistry) {
    registry.register(
        CHAT_INPUT,
        Arc::new(|spec: &NodeSpec, _: &ProcessorServices| -> Result<Arc<dyn NodeProcessor>> {
            Ok(Arc::new(ChatInputProcessor::new(parse(spec)?)))
        }),
    );
    registry.register(
        CHAT_OUTPUT,
        Arc::new(|spec: &NodeSpec, _: &ProcessorServices| -> Result<Arc<dyn NodeProcessor>> {
            let config: ChatOutputConfig = parse(spec)?;
            Ok(Arc::new(ChatOutputProcessor {
                template: config.template,
            }))
        }),
    );
    registry.alias("chatInputNode", CHAT_INPUT);
    registry.alias("chatOutputNode", CHAT_OUTPUT);
}
