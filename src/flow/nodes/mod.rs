//! 内置节点类型

mod agent;
mod chat;
mod knowledge;

pub use agent::{AgentNodeConfig, AgentNodeProcessor};
pub use chat::{ChatInputProcessor, ChatOutputProcessor};
pub use knowledge::KnowledgeToolProcessor;

use super::registry::ProcessorRegistry;

pub const AGENT: &str = "agent";
pub const KNOWLEDGE_TOOL: &str = "knowledge_tool";
pub const CHAT_INPUT: &str = "chat_input";
pub const CHAT_OUTPUT: &str = "chat_output";

pub(crate) fn register_builtin_processors(registry: &mut ProcessorRegistry) {
    agent::register(registry);
    knowledge::register(registry);
    chat::register(registry);
}
