use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, Result};

/// 工作流定义
///
/// 节点和边都在统一的数组中，由 JSON 驱动：
///
/// ```json
/// {
///   "nodes": [{ "id": "kb", "type": "knowledge_tool", "config": { "selectedBases": ["docs"] } }],
///   "edges": [],
///   "version": "1.0"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// 图节点定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// 节点唯一标识
    pub id: String,

    /// 节点类型，决定使用哪个 processor
    #[serde(rename = "type")]
    pub node_type: String,

    /// 节点配置；前端保存的格式使用 `data`
    #[serde(default, alias = "data")]
    pub config: Map<String, Value>,
}

/// 图边定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    #[serde(alias = "from")]
    pub source: String,
    #[serde(alias = "to")]
    pub target: String,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            config: Map::new(),
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        if let Value::Object(map) = config {
            self.config = map;
        }
        self
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }
}

impl EdgeSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl WorkflowDefinition {
    pub fn new(nodes: Vec<NodeSpec>, edges: Vec<EdgeSpec>) -> Self {
        Self {
            nodes,
            edges,
            version: default_version(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            EngineError::configuration(format!("failed to parse workflow definition: {e}"))
        })
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            EngineError::configuration(format!("failed to parse workflow definition: {e}"))
        })
    }

    /// 根据 ID 获取节点
    pub fn get_node(&self, node_id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// 获取从指定节点出发的边
    pub fn get_edges_from(&self, node_id: &str) -> Vec<&EdgeSpec> {
        self.edges.iter().filter(|e| e.source == node_id).collect()
    }

    /// 获取指向指定节点的边
    pub fn get_edges_to(&self, node_id: &str) -> Vec<&EdgeSpec> {
        self.edges.iter().filter(|e| e.target == node_id).collect()
    }

    /// 没有入边的节点（按声明顺序）
    pub fn entry_points(&self) -> Vec<&NodeSpec> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target == n.id))
            .collect()
    }

    /// 校验节点 ID 唯一以及边的两端都已声明
    pub fn validate_structure(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(EngineError::configuration("workflow has no nodes"));
        }

        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(EngineError::configuration(format!(
                    "duplicate node id `{}`",
                    node.id
                )));
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(EngineError::configuration(format!(
                        "dangling edge `{}` -> `{}`: unknown node `{}`",
                        edge.source, edge.target, endpoint
                    )));
                }
            }
        }

        Ok(())
    }
}
