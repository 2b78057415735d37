#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use genflow::config::{EdgeSpec, NodeSpec, WorkflowDefinition};
use genflow::knowledge::{KnowledgeQuery, KnowledgeSearch};
use genflow::llm::{
    ClientFactory, DynLlmClient, LlmClient, LlmRequest, LlmResponse, ModelConfiguration,
    ProviderSetup, StaticModelConfigs,
};
use genflow::{EngineError, Result};

/// 按脚本返回响应的模型；脚本耗尽后回显最后一条用户消息
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<LlmResponse>>>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<LlmResponse>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn last_request(&self) -> LlmRequest {
        self.requests.lock().last().cloned().expect("no request recorded")
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().push(request.clone());
        if let Some(next) = self.script.lock().pop_front() {
            return next;
        }
        Ok(LlmResponse::text(format!(
            "reply to: {}",
            request.last_user_message().unwrap_or_default()
        )))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// 记录构造次数的工厂；provider 为 `broken` 时构造失败
pub struct CountingFactory {
    pub builds: AtomicUsize,
    client: Option<Arc<ScriptedClient>>,
}

impl CountingFactory {
    /// 每次构造新的脚本客户端
    pub fn fresh() -> Arc<Self> {
        Arc::new(Self {
            builds: AtomicUsize::new(0),
            client: None,
        })
    }

    /// 总是返回同一个客户端，便于检查请求
    pub fn sharing(client: Arc<ScriptedClient>) -> Arc<Self> {
        Arc::new(Self {
            builds: AtomicUsize::new(0),
            client: Some(client),
        })
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ClientFactory for CountingFactory {
    fn build(&self, setup: &ProviderSetup) -> Result<DynLlmClient> {
        if setup.model == "broken" {
            return Err(EngineError::provider("cannot construct client"));
        }
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(match &self.client {
            Some(client) => Arc::clone(client) as DynLlmClient,
            None => ScriptedClient::new(Vec::new()) as DynLlmClient,
        })
    }
}

/// 返回固定文本的知识库
pub struct StubKnowledge {
    text: String,
    pub calls: Mutex<Vec<(String, KnowledgeQuery)>>,
}

impl StubKnowledge {
    pub fn new(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl KnowledgeSearch for StubKnowledge {
    async fn search(&self, query: &str, config: &KnowledgeQuery) -> Result<String> {
        self.calls.lock().push((query.to_string(), config.clone()));
        Ok(self.text.clone())
    }
}

pub fn echo_configs() -> Arc<StaticModelConfigs> {
    Arc::new(StaticModelConfigs::new(vec![
        ModelConfiguration::new("default-model", "echo", "echo").with_default(true),
    ]))
}

pub fn knowledge_node(id: &str) -> NodeSpec {
    NodeSpec::new(id, "knowledge_tool").with_config(json!({ "selectedBases": ["docs"] }))
}

pub fn agent_node(id: &str, config: Value) -> NodeSpec {
    NodeSpec::new(id, "agent").with_config(config)
}

pub fn linear(nodes: Vec<NodeSpec>) -> WorkflowDefinition {
    let edges = nodes
        .windows(2)
        .map(|pair| EdgeSpec::new(pair[0].id.clone(), pair[1].id.clone()))
        .collect();
    WorkflowDefinition::new(nodes, edges)
}

pub fn metadata(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
