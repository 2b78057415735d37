//! 命令行辅助：读取文件、组装引擎、执行子命令

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::config::{EngineConfig, WorkflowDefinition};
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::flow::{KnowledgeToolProcessor, NodeProcessor};
use crate::knowledge::{InMemoryKnowledgeBase, KnowledgeSearch};
use crate::llm::{Base64Cipher, ModelConfiguration, PlaintextCipher, SecretCipher, StaticModelConfigs};
use crate::runtime::RunResult;

/// 未提供模型配置文件时使用的本地回显模型
pub fn echo_model() -> ModelConfiguration {
    ModelConfiguration::new("local-echo", "echo", "echo").with_default(true)
}

pub fn load_definition(path: &Path) -> Result<WorkflowDefinition> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| EngineError::configuration(format!("failed to read {}: {e}", path.display())))?;
    WorkflowDefinition::from_json(&raw)
}

/// 解析 `--metadata` 参数；必须是 JSON 对象
pub fn parse_metadata(raw: Option<&str>) -> Result<Map<String, Value>> {
    match raw {
        None => Ok(Map::new()),
        Some(raw) => match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(map),
            other => Err(EngineError::configuration(format!(
                "metadata must be a JSON object, got {other}"
            ))),
        },
    }
}

pub fn load_knowledge(path: Option<&Path>) -> Result<Arc<InMemoryKnowledgeBase>> {
    Ok(Arc::new(match path {
        Some(path) => InMemoryKnowledgeBase::from_json_file(path)?,
        None => InMemoryKnowledgeBase::new(),
    }))
}

/// 组装本地引擎：模型配置来自文件（缺省为回显模型），知识库来自文件
pub async fn local_engine(
    models: Option<&Path>,
    knowledge: Option<&Path>,
    base64_keys: bool,
) -> Result<Engine> {
    let source = match models {
        Some(path) => StaticModelConfigs::from_json_file(path)?,
        None => StaticModelConfigs::new(vec![echo_model()]),
    };
    let cipher: Arc<dyn SecretCipher> = if base64_keys {
        Arc::new(Base64Cipher)
    } else {
        Arc::new(PlaintextCipher)
    };
    let engine = Engine::builder()
        .with_config(EngineConfig::from_env())
        .with_model_source(Arc::new(source))
        .with_cipher(cipher)
        .with_knowledge(load_knowledge(knowledge)?)
        .build();
    engine.start().await?;
    Ok(engine)
}

/// 编译定义并返回执行顺序
pub async fn validate_workflow(path: &Path) -> Result<Value> {
    let definition = load_definition(path)?;
    let engine = local_engine(None, None, false).await?;
    let plan = engine.agents().builder().compile(&definition)?;
    Ok(json!({
        "status": "valid",
        "version": plan.version(),
        "order": plan.order(),
    }))
}

pub async fn run_workflow(
    path: &Path,
    message: &str,
    metadata: Map<String, Value>,
    engine: &Engine,
) -> Result<RunResult> {
    let definition = load_definition(path)?;
    Ok(engine
        .runner()
        .run_from_definition(&definition, message, metadata)
        .await)
}

/// 单独执行一个知识库检索节点
pub async fn test_knowledge_tool(
    config: Value,
    query: &str,
    knowledge: Arc<dyn KnowledgeSearch>,
) -> Result<Value> {
    if query.trim().is_empty() {
        return Err(EngineError::configuration("Query is required"));
    }
    let processor = KnowledgeToolProcessor::from_config("test-knowledge-tool", config, knowledge)?;
    let mut input = Map::new();
    input.insert("query".into(), Value::from(query));
    let result = processor.process(input).await?;
    Ok(json!({ "status": "success", "result": result }))
}
