use std::sync::Arc;

use tracing::info;

use crate::agent::{AgentRecord, AgentRegistry, AgentRepository, InMemoryAgentRepository, RegistryItem};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::flow::{ProcessorRegistry, ProcessorServices, WorkflowBuilder};
use crate::knowledge::{InMemoryKnowledgeBase, KnowledgeSearch};
use crate::llm::{
    ClientFactory, DefaultClientFactory, ModelConfigSource, ModelRegistry, PlaintextCipher,
    SecretCipher, StaticModelConfigs,
};
use crate::runtime::WorkflowRunner;
use crate::state::{ContextStore, MemoryStore};
use crate::tools::DynamicToolGenerator;

/// 引擎服务容器的构建器
///
/// 所有协作方都可替换；未指定的使用内存实现。
pub struct EngineBuilder {
    config: EngineConfig,
    model_source: Arc<dyn ModelConfigSource>,
    cipher: Arc<dyn SecretCipher>,
    client_factory: Arc<dyn ClientFactory>,
    knowledge: Arc<dyn KnowledgeSearch>,
    store: Arc<dyn ContextStore>,
    repository: Arc<dyn AgentRepository>,
    tools: DynamicToolGenerator,
    processors: ProcessorRegistry,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            model_source: Arc::new(StaticModelConfigs::default()),
            cipher: Arc::new(PlaintextCipher),
            client_factory: Arc::new(DefaultClientFactory),
            knowledge: Arc::new(InMemoryKnowledgeBase::new()),
            store: Arc::new(MemoryStore::new()),
            repository: Arc::new(InMemoryAgentRepository::default()),
            tools: DynamicToolGenerator::new(),
            processors: ProcessorRegistry::with_builtins(),
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_model_source(mut self, source: Arc<dyn ModelConfigSource>) -> Self {
        self.model_source = source;
        self
    }

    pub fn with_cipher(mut self, cipher: Arc<dyn SecretCipher>) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn with_client_factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.client_factory = factory;
        self
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeSearch>) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn AgentRepository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_tool_generator(mut self, tools: DynamicToolGenerator) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_processors(mut self, processors: ProcessorRegistry) -> Self {
        self.processors = processors;
        self
    }

    pub fn build(self) -> Engine {
        let models = Arc::new(ModelRegistry::new(
            self.model_source,
            self.cipher,
            self.client_factory,
        ));
        let services = ProcessorServices::new(Arc::clone(&models), self.knowledge)
            .with_config(self.config.clone())
            .with_store(self.store)
            .with_tool_generator(self.tools);
        let builder = WorkflowBuilder::with_registry(self.processors, services);
        let agents = Arc::new(AgentRegistry::new(builder));

        Engine {
            config: self.config,
            runner: WorkflowRunner::new(Arc::clone(&agents)),
            models,
            agents,
            repository: self.repository,
        }
    }
}

/// 引擎：模型注册表、agent 注册表和执行入口
///
/// 生命周期：`build` -> `start`（加载模型配置和活跃 agent）-> `shutdown`。
pub struct Engine {
    config: EngineConfig,
    models: Arc<ModelRegistry>,
    agents: Arc<AgentRegistry>,
    runner: WorkflowRunner,
    repository: Arc<dyn AgentRepository>,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// 加载模型配置并注册所有活跃 agent
    pub async fn start(&self) -> Result<()> {
        let configurations = self.models.reload().await?;
        let agents = self.agents.initialize(self.repository.as_ref()).await?;
        info!(models = configurations.len(), agents, "engine started");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.agents.is_ready()
    }

    pub fn shutdown(&self) {
        self.agents.unregister_all();
        self.models.clear();
        info!("engine stopped");
    }

    /// agent 配置变更后同步注册表：活跃则重新编译，否则移除
    pub fn sync_agent(&self, record: AgentRecord) -> Result<Option<Arc<RegistryItem>>> {
        if record.is_active {
            let agent_id = record.id.clone();
            self.agents.register_agent(&agent_id, record).map(Some)
        } else {
            self.agents.unregister_agent(&record.id);
            Ok(None)
        }
    }

    pub fn remove_agent(&self, agent_id: &str) -> bool {
        self.agents.unregister_agent(agent_id)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn models(&self) -> &Arc<ModelRegistry> {
        &self.models
    }

    pub fn agents(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    pub fn runner(&self) -> &WorkflowRunner {
        &self.runner
    }
}
