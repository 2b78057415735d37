pub mod agent;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod flow;
pub mod knowledge;
pub mod llm;
pub mod runtime;
pub mod state;
pub mod tools;
pub mod utils;

pub use agent::{AgentRecord, AgentRegistry, AgentRepository, InMemoryAgentRepository, RegistryItem};
pub use config::{EdgeSpec, EngineConfig, EnvConfig, NodeSpec, WorkflowDefinition};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result};
pub use flow::{
    CompiledPlan, NodeInput, NodeOutput, NodeProcessor, ProcessorRegistry, ProcessorServices,
    WorkflowBuilder,
};
pub use knowledge::{InMemoryKnowledgeBase, KnowledgeQuery, KnowledgeSearch};
#[cfg(feature = "openai-client")]
pub use llm::GenericHttpClient;
pub use llm::{
    ClientFactory, DynLlmClient, LlmClient, LlmRequest, LlmResponse, LocalEchoClient,
    ModelConfiguration, ModelRegistry, SecretCipher,
};
pub use runtime::{RunRequest, RunResult, WorkflowRunner};
pub use state::{ContextStore, ExecutionContext, MemoryStore};
pub use tools::{DynamicToolGenerator, Tool, ToolConfig, ToolInvocation, ToolRegistry};
pub use utils::logging;
