//! 知识库检索
//!
//! 引擎只依赖 `KnowledgeSearch` 接口；`InMemoryKnowledgeBase` 用于本地运行和测试，
//! `HttpKnowledgeSearch` 对接外部检索服务。

mod memory;
#[cfg(feature = "openai-client")]
mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use memory::InMemoryKnowledgeBase;
#[cfg(feature = "openai-client")]
pub use remote::HttpKnowledgeSearch;

/// 检索配置（knowledge-tool 节点的 `config`）
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeQuery {
    #[serde(default, alias = "selected_bases", alias = "knowledgeBases")]
    pub selected_bases: Vec<String>,
    #[serde(default = "KnowledgeQuery::default_limit")]
    pub limit: usize,
    /// 没有命中时也返回 `limit` 条结果
    #[serde(default)]
    pub force: bool,
    /// 固定查询，覆盖运行时的用户输入
    #[serde(default)]
    pub query: Option<String>,
}

impl KnowledgeQuery {
    fn default_limit() -> usize {
        5
    }

    pub fn for_bases<I, S>(bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_bases: bases.into_iter().map(Into::into).collect(),
            limit: Self::default_limit(),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// 知识库检索接口：`search(query, config) -> text`
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    async fn search(&self, query: &str, config: &KnowledgeQuery) -> Result<String>;
}
