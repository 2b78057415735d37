// 状态管理模块

mod context;
mod memory;
mod store;

pub use context::{generate_thread_id, resolve_thread_id, ExecutionContext};
pub use memory::ConversationMemory;
#[cfg(feature = "redis-store")]
pub use store::redis_store::RedisStore;
pub use store::{ContextStore, MemoryStore};
