use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env::EnvConfig;

/// 引擎运行参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 检索上下文注入查询前的最大字符数
    #[serde(default = "EngineConfig::default_knowledge_context_limit")]
    pub knowledge_context_limit: usize,
    /// agent 节点工具调用循环的默认轮数上限
    #[serde(default = "EngineConfig::default_max_iterations")]
    pub default_max_iterations: u32,
    #[serde(default = "EngineConfig::default_temperature")]
    pub default_temperature: f32,
    /// 回放给模型的历史轮次上限
    #[serde(default = "EngineConfig::default_history_window")]
    pub history_window: usize,
    /// 单次模型调用超时（秒）
    #[serde(default = "EngineConfig::default_model_timeout_secs")]
    pub model_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            knowledge_context_limit: Self::default_knowledge_context_limit(),
            default_max_iterations: Self::default_max_iterations(),
            default_temperature: Self::default_temperature(),
            history_window: Self::default_history_window(),
            model_timeout_secs: Self::default_model_timeout_secs(),
        }
    }
}

impl EngineConfig {
    fn default_knowledge_context_limit() -> usize {
        1000
    }

    fn default_max_iterations() -> u32 {
        5
    }

    fn default_temperature() -> f32 {
        0.2
    }

    fn default_history_window() -> usize {
        20
    }

    fn default_model_timeout_secs() -> u64 {
        120
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs.max(1))
    }

    /// 默认值叠加环境变量覆盖
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(limit) = EnvConfig::get_parsed("GENFLOW_KNOWLEDGE_LIMIT") {
            config.knowledge_context_limit = limit;
        }
        if let Some(max) = EnvConfig::get_parsed::<u32>("GENFLOW_MAX_ITERATIONS") {
            config.default_max_iterations = max.max(1);
        }
        if let Some(temperature) = EnvConfig::get_parsed("GENFLOW_TEMPERATURE") {
            config.default_temperature = temperature;
        }
        if let Some(window) = EnvConfig::get_parsed("GENFLOW_HISTORY_WINDOW") {
            config.history_window = window;
        }
        if let Some(secs) = EnvConfig::get_parsed("GENFLOW_MODEL_TIMEOUT") {
            config.model_timeout_secs = secs;
        }
        config
    }
}
