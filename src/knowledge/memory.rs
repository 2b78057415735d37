use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{KnowledgeQuery, KnowledgeSearch};
use crate::error::{EngineError, Result};

/// 内存知识库：按段落切分文档，用查询词命中数排序
#[derive(Default)]
pub struct InMemoryKnowledgeBase {
    bases: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 `{ "<base id>": ["document", ...] }` 形式的 JSON 文件加载
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        let bases: HashMap<String, Vec<String>> = serde_json::from_str(&raw)?;
        Ok(Self {
            bases: RwLock::new(bases),
        })
    }

    pub fn add_document(&self, base_id: impl Into<String>, document: impl Into<String>) {
        self.bases
            .write()
            .entry(base_id.into())
            .or_default()
            .push(document.into());
    }

    fn terms(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.chars().count() > 2)
            .map(str::to_lowercase)
            .collect()
    }

    fn passages(document: &str) -> impl Iterator<Item = &str> {
        document
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

#[async_trait]
impl KnowledgeSearch for InMemoryKnowledgeBase {
    async fn search(&self, query: &str, config: &KnowledgeQuery) -> Result<String> {
        let terms = Self::terms(query);
        let bases = self.bases.read();

        let mut scored: Vec<(usize, &str)> = Vec::new();
        for base_id in &config.selected_bases {
            let Some(documents) = bases.get(base_id) else {
                continue;
            };
            for passage in documents.iter().flat_map(|d| Self::passages(d)) {
                let lowered = passage.to_lowercase();
                let score = terms.iter().filter(|t| lowered.contains(t.as_str())).count();
                if score > 0 || config.force {
                    scored.push((score, passage));
                }
            }
        }

        // 稳定排序：分数相同保持文档顺序
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        let hits: Vec<&str> = scored
            .into_iter()
            .take(config.limit.max(1))
            .map(|(_, passage)| passage)
            .collect();
        Ok(hits.join("\n\n"))
    }
}
