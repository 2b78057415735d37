use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::config::ToolConfig;
use super::tool::{Tool, ToolInvocation};
use crate::error::Result;
use crate::llm::ToolSpec;

/// 函数工具的具体行为
pub(crate) enum FunctionBody {
    /// 原样返回参数
    Echo { prefix: String },
    /// 用参数填充 `{name}` 占位符
    Template { template: String },
}

pub(crate) struct FunctionTool {
    spec: ToolSpec,
    body: FunctionBody,
}

impl FunctionTool {
    pub(crate) fn new(config: &ToolConfig, body: FunctionBody) -> Self {
        Self {
            spec: ToolSpec {
                name: config.name.clone(),
                description: config.description.clone(),
                parameters: config.parameters(),
            },
            body,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct EchoOptions {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "Echo".to_string()
}

#[derive(Deserialize)]
pub(crate) struct TemplateOptions {
    pub template: String,
}

pub(crate) fn render_template(template: &str, arguments: &Value) -> String {
    let mut rendered = template.to_string();
    if let Some(arguments) = arguments.as_object() {
        for (key, value) in arguments {
            let replacement = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            rendered = rendered.replace(&format!("{{{key}}}"), &replacement);
        }
    }
    rendered
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn spec(&self) -> ToolSpec {
        self.spec.clone()
    }

    async fn call(&self, invocation: ToolInvocation) -> Result<String> {
        Ok(match &self.body {
            FunctionBody::Echo { prefix } => format!("{prefix}: {}", invocation.input),
            FunctionBody::Template { template } => render_template(template, &invocation.input),
        })
    }
}
