use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;

/// 追加式列表存储，用于保存会话轮次
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// 返回 `key` 下最近的 `limit` 条记录（按写入顺序）
    async fn load(&self, key: &str, limit: usize) -> Result<Vec<String>>;
    async fn append(&self, key: &str, values: Vec<String>) -> Result<()>;
    async fn clear(&self, key: &str) -> Result<()>;
}

/// 内存存储实现
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextStore for MemoryStore {
    async fn load(&self, key: &str, limit: usize) -> Result<Vec<String>> {
        let inner = self.inner.read();
        Ok(inner
            .get(key)
            .map(|values| values[values.len().saturating_sub(limit)..].to_vec())
            .unwrap_or_default())
    }

    async fn append(&self, key: &str, values: Vec<String>) -> Result<()> {
        self.inner
            .write()
            .entry(key.to_string())
            .or_default()
            .extend(values);
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.inner.write().remove(key);
        Ok(())
    }
}

#[cfg(feature = "redis-store")]
pub mod redis_store {
    use super::*;
    use crate::error::EngineError;
    use ::redis::AsyncCommands;

    pub struct RedisStore {
        client: ::redis::Client,
    }

    impl RedisStore {
        pub fn new(client: ::redis::Client) -> Self {
            Self { client }
        }

        pub fn open(url: &str) -> Result<Self> {
            let client = ::redis::Client::open(url).map_err(|e| EngineError::Context(e.to_string()))?;
            Ok(Self::new(client))
        }

        async fn connection(&self) -> Result<::redis::aio::MultiplexedConnection> {
            self.client
                .get_multiplexed_async_connection()
                .await
                .map_err(|e| EngineError::Context(e.to_string()))
        }
    }

    #[async_trait]
    impl ContextStore for RedisStore {
        async fn load(&self, key: &str, limit: usize) -> Result<Vec<String>> {
            if limit == 0 {
                return Ok(Vec::new());
            }
            let mut conn = self.connection().await?;
            let start = -(limit as isize);
            let values: Vec<String> = conn
                .lrange(key, start, -1)
                .await
                .map_err(|e| EngineError::Context(e.to_string()))?;
            Ok(values)
        }

        async fn append(&self, key: &str, values: Vec<String>) -> Result<()> {
            if values.is_empty() {
                return Ok(());
            }
            let mut conn = self.connection().await?;
            let _: () = conn
                .rpush(key, values)
                .await
                .map_err(|e| EngineError::Context(e.to_string()))?;
            Ok(())
        }

        async fn clear(&self, key: &str) -> Result<()> {
            let mut conn = self.connection().await?;
            let _: () = conn
                .del(key)
                .await
                .map_err(|e| EngineError::Context(e.to_string()))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_returns_most_recent_window() {
        let store = MemoryStore::new();
        store
            .append("k", vec!["a".into(), "b".into(), "c".into()])
            .await
            .unwrap();

        assert_eq!(store.load("k", 2).await.unwrap(), vec!["b", "c"]);
        assert_eq!(store.load("k", 10).await.unwrap().len(), 3);
        assert!(store.load("missing", 5).await.unwrap().is_empty());

        store.clear("k").await.unwrap();
        assert!(store.load("k", 5).await.unwrap().is_empty());
    }
}
