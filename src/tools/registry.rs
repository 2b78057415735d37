use std::collections::HashMap;
use std::sync::Arc;

use super::tool::{Tool, ToolInvocation};
use crate::error::{EngineError, Result};
use crate::llm::ToolSpec;

/// 一次 agent 调用绑定的工具集合
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// 同名工具会被覆盖，保留首次注册的位置
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(Arc::clone)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// 按注册顺序返回工具描述
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    pub async fn call(&self, invocation: ToolInvocation) -> Result<String> {
        let tool = self
            .get(&invocation.name)
            .ok_or_else(|| EngineError::Tool(format!("tool `{}` is not bound", invocation.name)))?;
        tool.call(invocation).await
    }
}
