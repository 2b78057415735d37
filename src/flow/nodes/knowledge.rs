use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::KNOWLEDGE_TOOL;
use crate::config::NodeSpec;
use crate::error::{EngineError, Result};
use crate::flow::processor::{input_str, NodeInput, NodeOutput, NodeProcessor, ProcessorServices};
use crate::flow::registry::ProcessorRegistry;
use crate::knowledge::{KnowledgeQuery, KnowledgeSearch};

/// 知识库检索节点
///
/// 输出 `{status, response, knowledge_context, query}`；`response` 即检索文本，
/// 下游 agent 节点读取 `knowledge_context` 作为增强上下文。
pub struct KnowledgeToolProcessor {
    node_id: String,
    config: KnowledgeQuery,
    search: Arc<dyn KnowledgeSearch>,
}

impl KnowledgeToolProcessor {
    pub fn new(node_id: impl Into<String>, config: KnowledgeQuery, search: Arc<dyn KnowledgeSearch>) -> Self {
        Self {
            node_id: node_id.into(),
            config,
            search,
        }
    }

    /// 从节点配置 JSON 构造，供单独测试检索配置使用
    pub fn from_config(node_id: impl Into<String>, config: Value, search: Arc<dyn KnowledgeSearch>) -> Result<Self> {
        let node_id = node_id.into();
        let config: KnowledgeQuery = serde_json::from_value(config).map_err(|e| {
            EngineError::configuration(format!("invalid config for knowledge node `{node_id}`: {e}"))
        })?;
        Ok(Self::new(node_id, config, search))
    }
}

#[async_trait]
impl NodeProcessor for KnowledgeToolProcessor {
    fn kind(&self) -> &'static str {
        KNOWLEDGE_TOOL
    }

    async fn process(&self, input: NodeInput) -> Result<NodeOutput> {
        let query = self
            .config
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .or_else(|| input_str(&input, "query"))
            .ok_or_else(|| EngineError::configuration("Query is required"))?;
        if self.config.selected_bases.is_empty() {
            return Err(EngineError::configuration(format!(
                "knowledge node `{}` has no knowledge bases selected",
                self.node_id
            )));
        }

        let text = self.search.search(query, &self.config).await?;
        debug!(node = %self.node_id, chars = text.len(), "knowledge search finished");

        let output = json!({
            "status": "success",
            "response": text,
            "knowledge_context": text,
            "query": query,
        });
        Ok(output.as_object().cloned().unwrap_or_default())
    }
}

pub(super) fn register(registry: &mut ProcessorRegistry) {
    registry.register(
        KNOWLEDGE_TOOL,
        Arc::new(|spec: &NodeSpec, services: &ProcessorServices| -> Result<Arc<dyn NodeProcessor>> {
            Ok(Arc::new(KnowledgeToolProcessor::from_config(
                spec.id.clone(),
                Value::Object(spec.config.clone()),
                Arc::clone(&services.knowledge),
            )?))
        }),
    );
    registry.alias("knowledgeBaseNode", KNOWLEDGE_TOOL);
}
