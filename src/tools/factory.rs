use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::config::{FunctionConfig, ToolConfig, ToolKind};
use super::function::{EchoOptions, FunctionBody, FunctionTool, TemplateOptions};
use super::tool::Tool;
use crate::error::{EngineError, Result};

/// 函数工具工厂：`(tool config, function options) -> tool`
pub type FunctionFactory =
    Arc<dyn Fn(&ToolConfig, &Map<String, Value>) -> Result<Arc<dyn Tool>> + Send + Sync>;

/// 把工具配置记录转换成可调用工具
pub struct DynamicToolGenerator {
    functions: HashMap<String, FunctionFactory>,
}

impl Default for DynamicToolGenerator {
    fn default() -> Self {
        let mut generator = Self::empty();
        register_builtin_functions(&mut generator);
        generator
    }
}

impl DynamicToolGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 不带内置函数的生成器
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register_function<T: Into<String>>(&mut self, name: T, factory: FunctionFactory) {
        self.functions.insert(name.into(), factory);
    }

    pub fn generate_tool(&self, config: &ToolConfig) -> Result<Arc<dyn Tool>> {
        match config.kind {
            ToolKind::Function => {
                let FunctionConfig { function, options } =
                    config.function_config.as_ref().ok_or_else(|| {
                        EngineError::configuration(format!(
                            "function tool `{}` has no function_config",
                            config.name
                        ))
                    })?;
                let factory = self.functions.get(function).ok_or_else(|| {
                    EngineError::configuration(format!(
                        "tool `{}` references unknown function `{function}`",
                        config.name
                    ))
                })?;
                factory(config, options)
            }
            ToolKind::Api => Self::generate_api_tool(config),
        }
    }

    #[cfg(feature = "openai-client")]
    fn generate_api_tool(config: &ToolConfig) -> Result<Arc<dyn Tool>> {
        let api = config.api_config.clone().ok_or_else(|| {
            EngineError::configuration(format!("api tool `{}` has no api_config", config.name))
        })?;
        Ok(Arc::new(super::api::ApiTool::new(config, api)?))
    }

    #[cfg(not(feature = "openai-client"))]
    fn generate_api_tool(config: &ToolConfig) -> Result<Arc<dyn Tool>> {
        Err(EngineError::configuration(format!(
            "api tool `{}` requires the `openai-client` feature",
            config.name
        )))
    }

    /// 批量生成；任何一个失败都会让整个绑定失败
    pub fn generate_tools_from_configs(&self, configs: &[ToolConfig]) -> Result<Vec<Arc<dyn Tool>>> {
        let tools = configs
            .iter()
            .map(|config| self.generate_tool(config))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = tools.len(), "generated tools from configs");
        Ok(tools)
    }
}

fn extract_options<T: DeserializeOwned>(tool: &ToolConfig, options: &Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(options.clone())).map_err(|e| {
        EngineError::configuration(format!("invalid function_config for `{}`: {e}", tool.name))
    })
}

fn register_builtin_functions(generator: &mut DynamicToolGenerator) {
    generator.register_function(
        "echo",
        Arc::new(|tool: &ToolConfig, options: &Map<String, Value>| -> Result<Arc<dyn Tool>> {
            let options: EchoOptions = extract_options(tool, options)?;
            Ok(Arc::new(FunctionTool::new(
                tool,
                FunctionBody::Echo {
                    prefix: options.prefix,
                },
            )))
        }),
    );

    generator.register_function(
        "template",
        Arc::new(|tool: &ToolConfig, options: &Map<String, Value>| -> Result<Arc<dyn Tool>> {
            let options: TemplateOptions = extract_options(tool, options)?;
            Ok(Arc::new(FunctionTool::new(
                tool,
                FunctionBody::Template {
                    template: options.template,
                },
            )))
        }),
    );
}
