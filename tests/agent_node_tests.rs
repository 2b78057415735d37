mod common;

use std::sync::Arc;

use serde_json::{json, Value};

use common::{metadata, CountingFactory, ScriptedClient, StubKnowledge};
use genflow::config::EngineConfig;
use genflow::flow::{AgentNodeConfig, AgentNodeProcessor, NodeProcessor, ProcessorServices};
use genflow::llm::{LlmResponse, MessageRole, ModelConfiguration, ModelRegistry, PlaintextCipher, StaticModelConfigs, ToolCall};
use genflow::{EngineError, LlmRequest};

struct Harness {
    client: Arc<ScriptedClient>,
    services: ProcessorServices,
}

async fn harness(script: Vec<genflow::Result<LlmResponse>>, knowledge: &str, config: EngineConfig) -> Harness {
    let client = ScriptedClient::new(script);
    let models = Arc::new(ModelRegistry::new(
        Arc::new(StaticModelConfigs::new(vec![
            ModelConfiguration::new("default-model", "echo", "echo").with_default(true),
        ])),
        Arc::new(PlaintextCipher),
        CountingFactory::sharing(client.clone()),
    ));
    models.reload().await.unwrap();
    let services = ProcessorServices::new(models, StubKnowledge::new(knowledge)).with_config(config);
    Harness { client, services }
}

fn processor(harness: &Harness, config: Value) -> AgentNodeProcessor {
    let config: AgentNodeConfig = serde_json::from_value(config).unwrap();
    AgentNodeProcessor::new("agent", config, harness.services.clone()).unwrap()
}

fn tool_call(id: &str, name: &str, arguments: Value) -> LlmResponse {
    LlmResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
        metadata: None,
    }
}

fn greet_tool() -> Value {
    json!({
        "name": "greet",
        "description": "Greets a person by name",
        "type": "function",
        "function_config": { "function": "template", "template": "Hello, {name}!" },
        "parameters_schema": {
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": ["name"]
        }
    })
}

fn user_messages(request: &LlmRequest) -> Vec<&str> {
    request
        .messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
        .collect()
}

#[tokio::test]
async fn own_knowledge_augments_query_and_prompt() {
    let h = harness(Vec::new(), "RAM: 8GB minimum", EngineConfig::default()).await;
    let node = processor(
        &h,
        json!({ "systemPrompt": "Support bot", "knowledge": { "selectedBases": ["docs"], "limit": 2 } }),
    );
    assert!(node.system_prompt().contains("Your primary role: Support bot"));
    assert!(node.system_prompt().contains("IMPORTANT KNOWLEDGE BASE INSTRUCTIONS:"));
    assert!(!node.system_prompt().contains("TOOLS INSTRUCTIONS"));

    let output = node
        .process(metadata(json!({ "query": "Specs?", "thread_id": "t1" })))
        .await
        .unwrap();

    assert_eq!(output["status"], "success");
    assert_eq!(output["rag_used"], true);
    assert_eq!(output["thread_id"], "t1");
    let sent = h.client.last_request();
    assert_eq!(sent.system.as_deref(), Some(node.system_prompt()));
    assert_eq!(
        sent.last_user_message().unwrap(),
        "I need information about: Specs?\n\nHere's some context that might help:\nRAM: 8GB minimum\n\nPlease use this context to provide a comprehensive answer."
    );
}

#[tokio::test]
async fn empty_retrieval_leaves_query_untouched() {
    let h = harness(Vec::new(), "", EngineConfig::default()).await;
    let node = processor(&h, json!({ "knowledge": { "selectedBases": ["docs"] } }));

    let output = node.process(metadata(json!({ "query": "Specs?" }))).await.unwrap();

    assert_eq!(output["rag_used"], false);
    assert_eq!(h.client.last_request().last_user_message(), Some("Specs?"));
}

#[tokio::test]
async fn retrieved_context_is_truncated() {
    let config = EngineConfig {
        knowledge_context_limit: 12,
        ..EngineConfig::default()
    };
    let h = harness(Vec::new(), "", config).await;
    let node = processor(&h, json!({}));

    let upstream = json!({ "kb": { "knowledge_context": "0123456789abcdefghij" } });
    node.process(metadata(json!({ "query": "q", "upstream": upstream })))
        .await
        .unwrap();

    let user = h.client.last_request().last_user_message().unwrap().to_string();
    assert!(user.contains("help:\n0123456789ab\n\n"));
    assert!(!user.contains("abc"));
}

#[tokio::test]
async fn tool_calls_run_and_feed_results_back() {
    let h = harness(
        vec![
            Ok(tool_call("call-1", "greet", json!({ "name": "Ada" }))),
            Ok(LlmResponse::text("Ada has been greeted.")),
        ],
        "",
        EngineConfig::default(),
    )
    .await;
    let node = processor(&h, json!({ "tools": [greet_tool()] }));
    assert!(node.system_prompt().contains("IMPORTANT TOOLS INSTRUCTIONS:"));

    let output = node.process(metadata(json!({ "query": "Say hi to Ada" }))).await.unwrap();

    assert_eq!(output["status"], "success");
    assert_eq!(output["response"], "Ada has been greeted.");
    let requests = h.client.requests.lock();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools[0].name, "greet");
    let tool_message = requests[1].messages.last().unwrap();
    assert_eq!(tool_message.role, MessageRole::Tool);
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call-1"));
    assert_eq!(tool_message.content, "Hello, Ada!");
}

#[tokio::test]
async fn unknown_tool_errors_are_returned_to_the_model() {
    let h = harness(
        vec![
            Ok(tool_call("call-1", "missing_tool", json!({}))),
            Ok(LlmResponse::text("Sorry, that tool is unavailable.")),
        ],
        "",
        EngineConfig::default(),
    )
    .await;
    let node = processor(&h, json!({ "tools": [greet_tool()] }));

    let output = node.process(metadata(json!({ "query": "Use a tool" }))).await.unwrap();

    assert_eq!(output["status"], "success");
    let tool_message = h.client.last_request().messages.last().cloned().unwrap();
    assert!(tool_message.content.starts_with("Error: tool error:"));
}

#[tokio::test]
async fn exhausting_iterations_is_a_soft_failure() {
    let h = harness(
        vec![
            Ok(tool_call("c1", "greet", json!({ "name": "A" }))),
            Ok(tool_call("c2", "greet", json!({ "name": "B" }))),
            Ok(LlmResponse::text("never reached")),
        ],
        "",
        EngineConfig::default(),
    )
    .await;
    let node = processor(&h, json!({ "tools": [greet_tool()], "maxIterations": 2 }));

    let output = node.process(metadata(json!({ "query": "loop" }))).await.unwrap();

    assert_eq!(output["status"], "error");
    assert_eq!(
        output["response"],
        "Agent failed to run query: exceeded maximum of 2 tool iterations"
    );
}

#[tokio::test]
async fn model_errors_and_empty_replies_are_soft_failures() {
    let h = harness(
        vec![Err(EngineError::provider("rate limited")), Ok(LlmResponse::text("  "))],
        "",
        EngineConfig::default(),
    )
    .await;
    let node = processor(&h, json!({}));

    let first = node.process(metadata(json!({ "query": "one" }))).await.unwrap();
    assert_eq!(first["status"], "error");
    assert_eq!(first["response"], "Agent failed to run query: provider error: rate limited");

    let second = node.process(metadata(json!({ "query": "two" }))).await.unwrap();
    assert_eq!(second["status"], "error");
    assert!(second["response"].as_str().unwrap().contains("empty response"));
}

#[tokio::test]
async fn missing_query_is_configuration_error() {
    let h = harness(Vec::new(), "", EngineConfig::default()).await;
    let node = processor(&h, json!({}));

    let err = node.process(metadata(json!({ "query": "" }))).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("Query is required"));
}

#[tokio::test]
async fn memory_replays_previous_turns_for_the_same_thread() {
    let h = harness(Vec::new(), "", EngineConfig::default()).await;
    let node = processor(&h, json!({}));

    node.process(metadata(json!({ "query": "My name is Ada", "thread_id": "t1" })))
        .await
        .unwrap();
    node.process(metadata(json!({ "query": "What is my name?", "thread_id": "t1" })))
        .await
        .unwrap();
    let second = h.client.last_request();
    assert_eq!(second.messages.len(), 3);
    assert_eq!(user_messages(&second), vec!["My name is Ada", "What is my name?"]);
    assert_eq!(second.messages[1].content, "reply to: My name is Ada");

    node.process(metadata(json!({ "query": "Fresh start", "thread_id": "t2" })))
        .await
        .unwrap();
    assert_eq!(h.client.last_request().messages.len(), 1);
}

#[tokio::test]
async fn memory_can_be_disabled() {
    let h = harness(Vec::new(), "", EngineConfig::default()).await;
    let node = processor(&h, json!({ "memory": false }));

    for query in ["first", "second"] {
        node.process(metadata(json!({ "query": query, "thread_id": "t1" })))
            .await
            .unwrap();
    }
    assert_eq!(h.client.last_request().messages.len(), 1);
}

#[tokio::test]
async fn user_prompt_template_wraps_the_query() {
    let h = harness(Vec::new(), "", EngineConfig::default()).await;
    let node = processor(&h, json!({ "userPrompt": "Answer in French: {query}", "temperature": 0.7 }));

    node.process(metadata(json!({ "query": "Hello" }))).await.unwrap();

    let sent = h.client.last_request();
    assert_eq!(sent.last_user_message(), Some("Answer in French: Hello"));
    assert!((sent.temperature - 0.7).abs() < f32::EPSILON);
}

#[test]
fn unknown_tool_function_fails_construction() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let h = runtime.block_on(harness(Vec::new(), "", EngineConfig::default()));
    let config: AgentNodeConfig = serde_json::from_value(json!({
        "tools": [{ "name": "x", "type": "function", "function_config": { "function": "nope" } }]
    }))
    .unwrap();

    let err = AgentNodeProcessor::new("agent", config, h.services.clone()).err().unwrap();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn configured_history_window_limits_replayed_turns() {
    let config = EngineConfig {
        history_window: 1,
        ..EngineConfig::default()
    };
    let h = harness(Vec::new(), "", config).await;
    assert_eq!(h.services.memory.window(), 1);
    let node = processor(&h, json!({}));

    for query in ["first", "second", "third"] {
        node.process(metadata(json!({ "query": query, "thread_id": "t1" })))
            .await
            .unwrap();
    }

    let sent = h.client.last_request();
    assert_eq!(user_messages(&sent), vec!["second", "third"]);
    assert_eq!(sent.messages.len(), 3);
    assert_eq!(sent.messages[0].role, MessageRole::User);
}
