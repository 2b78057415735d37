pub mod engine;
pub mod env;
pub mod workflow;

pub use engine::EngineConfig;
pub use env::EnvConfig;
pub use workflow::{EdgeSpec, NodeSpec, WorkflowDefinition};
