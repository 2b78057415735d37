use std::collections::HashMap;
use std::sync::Arc;

use super::nodes;
use super::processor::{NodeProcessor, ProcessorServices};
use crate::config::NodeSpec;
use crate::error::{EngineError, Result};

/// 节点处理器工厂：`(node spec, services) -> processor`
pub type ProcessorFactory =
    Arc<dyn Fn(&NodeSpec, &ProcessorServices) -> Result<Arc<dyn NodeProcessor>> + Send + Sync>;

/// 节点类型注册表
///
/// 新的节点类型通过 `register` 加入，构建器本身不需要修改。
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    factories: HashMap<String, ProcessorFactory>,
    aliases: HashMap<String, String>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册内置节点类型
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        nodes::register_builtin_processors(&mut registry);
        registry
    }

    pub fn register<T: Into<String>>(&mut self, kind: T, factory: ProcessorFactory) {
        self.factories.insert(kind.into(), factory);
    }

    /// 为已注册类型增加别名（如前端使用的 `agentNode`）
    pub fn alias<A: Into<String>, T: Into<String>>(&mut self, alias: A, kind: T) {
        self.aliases.insert(alias.into(), kind.into());
    }

    /// 解析别名后的规范类型
    pub fn canonical<'a>(&'a self, kind: &'a str) -> &'a str {
        self.aliases.get(kind).map(String::as_str).unwrap_or(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(self.canonical(kind))
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn build(&self, spec: &NodeSpec, services: &ProcessorServices) -> Result<Arc<dyn NodeProcessor>> {
        let factory = self.factories.get(self.canonical(&spec.node_type)).ok_or_else(|| {
            EngineError::configuration(format!(
                "unknown node type `{}` for node `{}`",
                spec.node_type, spec.id
            ))
        })?;
        factory(spec, services)
    }
}
