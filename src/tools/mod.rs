//! 工具：配置记录、动态生成和调用

#[cfg(feature = "openai-client")]
mod api;
mod config;
mod factory;
mod function;
mod registry;
mod tool;

pub use config::{ApiConfig, FunctionConfig, ToolConfig, ToolKind};
pub use factory::{DynamicToolGenerator, FunctionFactory};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolInvocation};
