use std::sync::Arc;

use super::store::ContextStore;
use crate::error::Result;
use crate::llm::LlmMessage;

const THREAD_PREFIX: &str = "thread";

/// 按 thread id 保存的对话历史
///
/// 只持久化用户和助手的最终消息，工具调用中间轮次不写入。
#[derive(Clone)]
pub struct ConversationMemory {
    store: Arc<dyn ContextStore>,
    window: usize,
}

impl ConversationMemory {
    pub fn new(store: Arc<dyn ContextStore>, window: usize) -> Self {
        Self { store, window }
    }

    /// 同一存储，不同窗口
    pub fn with_window(&self, window: usize) -> Self {
        Self {
            store: Arc::clone(&self.store),
            window,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    fn key_with_prefix(thread_id: &str) -> String {
        format!("{THREAD_PREFIX}:{thread_id}")
    }

    /// 最近 `window` 轮对话；一轮是一条用户消息加一条助手消息
    pub async fn history(&self, thread_id: &str) -> Result<Vec<LlmMessage>> {
        let raw = self
            .store
            .load(&Self::key_with_prefix(thread_id), self.window.saturating_mul(2))
            .await?;
        raw.iter()
            .map(|entry| serde_json::from_str(entry).map_err(Into::into))
            .collect()
    }

    pub async fn record_turn(&self, thread_id: &str, query: &str, reply: &str) -> Result<()> {
        let entries = [LlmMessage::user(query), LlmMessage::assistant(reply)]
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.store
            .append(&Self::key_with_prefix(thread_id), entries)
            .await
    }

    pub async fn clear(&self, thread_id: &str) -> Result<()> {
        self.store.clear(&Self::key_with_prefix(thread_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStore;

    #[tokio::test]
    async fn turns_are_scoped_per_thread() {
        let memory = ConversationMemory::new(Arc::new(MemoryStore::new()), 10);
        memory.record_turn("t1", "hi", "hello").await.unwrap();
        memory.record_turn("t2", "other", "reply").await.unwrap();

        let history = memory.history("t1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hi");
        assert_eq!(history[1].role, crate::llm::MessageRole::Assistant);
        assert_eq!(memory.history("t2").await.unwrap()[0].content, "other");
    }

    async fn contents(memory: &ConversationMemory, thread_id: &str) -> Vec<String> {
        memory
            .history(thread_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect()
    }

    #[tokio::test]
    async fn window_counts_whole_turns() {
        let memory = ConversationMemory::new(Arc::new(MemoryStore::new()), 2);
        for (q, a) in [("q1", "a1"), ("q2", "a2"), ("q3", "a3")] {
            memory.record_turn("t", q, a).await.unwrap();
        }

        assert_eq!(contents(&memory, "t").await, vec!["q2", "a2", "q3", "a3"]);
    }

    #[tokio::test]
    async fn odd_window_starts_with_user_message() {
        let memory = ConversationMemory::new(Arc::new(MemoryStore::new()), 3);
        for (q, a) in [("q1", "a1"), ("q2", "a2"), ("q3", "a3"), ("q4", "a4")] {
            memory.record_turn("t", q, a).await.unwrap();
        }

        let history = memory.history("t").await.unwrap();
        assert_eq!(history.len(), 6);
        assert_eq!(history[0].role, crate::llm::MessageRole::User);
        assert_eq!(contents(&memory, "t").await[..2], ["q2", "a2"]);
    }
}
