//! 工作流编译和节点处理

pub mod builder;
pub mod nodes;
pub mod plan;
pub mod processor;
pub mod prompt;
pub mod registry;

pub use builder::{execution_order, WorkflowBuilder};
pub use nodes::{AgentNodeConfig, AgentNodeProcessor, ChatInputProcessor, ChatOutputProcessor, KnowledgeToolProcessor};
pub use plan::{CompiledPlan, PlanStep};
pub use processor::{NodeInput, NodeOutput, NodeProcessor, ProcessorServices};
pub use registry::{ProcessorFactory, ProcessorRegistry};
