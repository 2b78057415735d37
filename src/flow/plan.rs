use std::fmt;
use std::sync::Arc;

use super::processor::NodeProcessor;
use crate::config::NodeSpec;

/// 计划中的一步：节点定义及其处理器实例
#[derive(Clone)]
pub struct PlanStep {
    pub spec: NodeSpec,
    pub processor: Arc<dyn NodeProcessor>,
}

/// 编译后的工作流：按执行顺序排列的步骤，编译后不可变
#[derive(Clone)]
pub struct CompiledPlan {
    version: String,
    steps: Arc<[PlanStep]>,
}

impl CompiledPlan {
    pub(crate) fn new(version: String, steps: Vec<PlanStep>) -> Self {
        Self {
            version,
            steps: steps.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// 执行顺序中的节点 ID
    pub fn order(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.spec.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Debug for CompiledPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPlan")
            .field("version", &self.version)
            .field("order", &self.order())
            .finish()
    }
}
