use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use super::plan::{CompiledPlan, PlanStep};
use super::processor::ProcessorServices;
use super::registry::ProcessorRegistry;
use crate::config::WorkflowDefinition;
use crate::error::{EngineError, Result};

/// 工作流构建器：把定义编译成可执行计划
///
/// 编译不修改输入定义，也不做网络或持久化 I/O。
#[derive(Clone)]
pub struct WorkflowBuilder {
    processors: ProcessorRegistry,
    services: ProcessorServices,
}

impl WorkflowBuilder {
    pub fn new(services: ProcessorServices) -> Self {
        Self::with_registry(ProcessorRegistry::with_builtins(), services)
    }

    pub fn with_registry(processors: ProcessorRegistry, services: ProcessorServices) -> Self {
        Self {
            processors,
            services,
        }
    }

    pub fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    pub fn services(&self) -> &ProcessorServices {
        &self.services
    }

    pub fn compile(&self, definition: &WorkflowDefinition) -> Result<CompiledPlan> {
        definition.validate_structure()?;

        // 先确认所有类型都已注册，再计算顺序和实例化
        if let Some(node) = definition
            .nodes
            .iter()
            .find(|n| !self.processors.contains(&n.node_type))
        {
            return Err(EngineError::configuration(format!(
                "unknown node type `{}` for node `{}`",
                node.node_type, node.id
            )));
        }

        let order = execution_order(definition)?;
        let steps = order
            .into_iter()
            .map(|index| {
                let spec = definition.nodes[index].clone();
                let processor = self.processors.build(&spec, &self.services)?;
                Ok(PlanStep { spec, processor })
            })
            .collect::<Result<Vec<_>>>()?;

        let plan = CompiledPlan::new(definition.version.clone(), steps);
        debug!(order = ?plan.order(), "compiled workflow");
        Ok(plan)
    }
}

/// 拓扑排序（Kahn），多个节点同时就绪时按声明顺序
///
/// 返回节点在 `definition.nodes` 中的下标。任何环都会报错。
pub fn execution_order(definition: &WorkflowDefinition) -> Result<Vec<usize>> {
    let index: HashMap<&str, usize> = definition
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; definition.nodes.len()];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); definition.nodes.len()];
    for edge in &definition.edges {
        let (Some(&from), Some(&to)) = (
            index.get(edge.source.as_str()),
            index.get(edge.target.as_str()),
        ) else {
            return Err(EngineError::configuration(format!(
                "dangling edge `{}` -> `{}`",
                edge.source, edge.target
            )));
        };
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(definition.nodes.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &next in &successors[node] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() != definition.nodes.len() {
        let stuck: Vec<&str> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree > 0)
            .map(|(i, _)| definition.nodes[i].id.as_str())
            .collect();
        return Err(EngineError::configuration(format!(
            "cyclic workflow: nodes {stuck:?} are part of or depend on a cycle"
        )));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EdgeSpec, NodeSpec};

    fn definition(ids: &[&str], edges: &[(&str, &str)]) -> WorkflowDefinition {
        WorkflowDefinition::new(
            ids.iter().map(|id| NodeSpec::new(*id, "chat_output")).collect(),
            edges.iter().map(|(a, b)| EdgeSpec::new(*a, *b)).collect(),
        )
    }

    fn ids(def: &WorkflowDefinition, order: Vec<usize>) -> Vec<String> {
        order.into_iter().map(|i| def.nodes[i].id.clone()).collect()
    }

    #[test]
    fn declaration_order_breaks_ties() {
        let def = definition(&["c", "a", "b"], &[("a", "b")]);
        assert_eq!(ids(&def, execution_order(&def).unwrap()), vec!["c", "a", "b"]);
    }

    #[test]
    fn edges_override_declaration_order() {
        let def = definition(&["out", "agent", "kb"], &[("kb", "agent"), ("agent", "out")]);
        assert_eq!(
            ids(&def, execution_order(&def).unwrap()),
            vec!["kb", "agent", "out"]
        );
    }

    #[test]
    fn diamond_is_deterministic() {
        let def = definition(
            &["start", "right", "left", "join"],
            &[("start", "left"), ("start", "right"), ("left", "join"), ("right", "join")],
        );
        assert_eq!(
            ids(&def, execution_order(&def).unwrap()),
            vec!["start", "right", "left", "join"]
        );
    }

    #[test]
    fn cycles_are_rejected_anywhere() {
        let detached = definition(&["entry", "x", "y"], &[("x", "y"), ("y", "x")]);
        let err = execution_order(&detached).unwrap_err();
        assert!(err.to_string().contains("cyclic workflow"));

        let self_loop = definition(&["a"], &[("a", "a")]);
        assert!(execution_order(&self_loop).unwrap_err().is_configuration());
    }
}
