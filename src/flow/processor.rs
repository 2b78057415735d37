use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::knowledge::KnowledgeSearch;
use crate::llm::ModelRegistry;
use crate::state::{ContextStore, ConversationMemory, MemoryStore};
use crate::tools::DynamicToolGenerator;

/// 节点输入：执行上下文快照
pub type NodeInput = Map<String, Value>;
/// 节点输出
pub type NodeOutput = Map<String, Value>;

/// 节点处理器
///
/// 每个节点类型实现同一个 `process(input) -> output` 契约。返回 `Err` 表示
/// 致命错误，会终止当前执行；可恢复的失败以 `status: "error"` 输出表示。
#[async_trait]
pub trait NodeProcessor: Send + Sync {
    /// 规范化的节点类型标签
    fn kind(&self) -> &'static str;

    async fn process(&self, input: NodeInput) -> Result<NodeOutput>;
}

/// 节点构造时可用的共享服务
#[derive(Clone)]
pub struct ProcessorServices {
    pub models: Arc<ModelRegistry>,
    pub knowledge: Arc<dyn KnowledgeSearch>,
    pub memory: ConversationMemory,
    pub tools: Arc<DynamicToolGenerator>,
    pub config: Arc<EngineConfig>,
}

impl ProcessorServices {
    pub fn new(models: Arc<ModelRegistry>, knowledge: Arc<dyn KnowledgeSearch>) -> Self {
        let config = Arc::new(EngineConfig::default());
        Self {
            models,
            knowledge,
            memory: ConversationMemory::new(Arc::new(MemoryStore::new()), config.history_window),
            tools: Arc::new(DynamicToolGenerator::new()),
            config,
        }
    }

    /// 替换运行参数；会话记忆按新的窗口重建，存储保持不变
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.memory = self.memory.with_window(config.history_window);
        self.config = Arc::new(config);
        self
    }

    /// 替换会话存储；窗口大小取当前配置
    pub fn with_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.memory = ConversationMemory::new(store, self.config.history_window);
        self
    }

    pub fn with_tool_generator(mut self, generator: DynamicToolGenerator) -> Self {
        self.tools = Arc::new(generator);
        self
    }
}

/// 读取输入中的字符串字段（去除首尾空白，空串视为缺失）
pub fn input_str<'a>(input: &'a NodeInput, key: &str) -> Option<&'a str> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
