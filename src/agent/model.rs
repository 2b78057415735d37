use serde::{Deserialize, Serialize};

use crate::config::WorkflowDefinition;

/// 持久化层返回的 agent 元数据（已关联工作流）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active", deserialize_with = "crate::utils::de::bool_or_int")]
    pub is_active: bool,
    #[serde(default)]
    pub welcome_message: Option<String>,
    /// 推荐问题；持久化形式是 `;` 分隔的字符串
    #[serde(default, deserialize_with = "crate::utils::de::string_list")]
    pub possible_queries: Vec<String>,
    #[serde(default)]
    pub operator_id: Option<String>,
    #[serde(default)]
    pub workflow: Option<AgentWorkflow>,
}

fn default_active() -> bool {
    true
}

/// agent 关联的工作流
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentWorkflow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub definition: WorkflowDefinition,
}

impl AgentRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            is_active: true,
            welcome_message: None,
            possible_queries: Vec::new(),
            operator_id: None,
            workflow: None,
        }
    }

    pub fn with_workflow(mut self, workflow_id: impl Into<String>, definition: WorkflowDefinition) -> Self {
        self.workflow = Some(AgentWorkflow {
            id: workflow_id.into(),
            name: None,
            definition,
        });
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}
