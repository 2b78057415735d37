pub mod model;
pub mod registry;
pub mod repository;

pub use model::{AgentRecord, AgentWorkflow};
pub use registry::{AgentRegistry, RegistryItem};
pub use repository::{AgentRepository, InMemoryAgentRepository};
