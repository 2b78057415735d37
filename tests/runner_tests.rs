mod common;

use std::sync::Arc;

use serde_json::json;

use common::{agent_node, echo_configs, knowledge_node, linear, metadata, CountingFactory, ScriptedClient, StubKnowledge};
use genflow::agent::{AgentRecord, InMemoryAgentRepository};
use genflow::config::{NodeSpec, WorkflowDefinition};
use genflow::llm::{ModelConfiguration, StaticModelConfigs};
use genflow::{Engine, EngineError, RunRequest, RunResult};

const REQUIREMENTS: &str = "2. System Requirements\n- RAM: 8GB minimum, 16GB recommended";

fn engine_with(knowledge: Arc<StubKnowledge>, factory: Arc<CountingFactory>) -> Engine {
    Engine::builder()
        .with_model_source(echo_configs())
        .with_client_factory(factory)
        .with_knowledge(knowledge)
        .build()
}

fn knowledge_only() -> WorkflowDefinition {
    WorkflowDefinition::new(vec![knowledge_node("a")], vec![])
}

#[tokio::test]
async fn knowledge_workflow_returns_retrieved_text() {
    let knowledge = StubKnowledge::new(REQUIREMENTS);
    let engine = engine_with(knowledge.clone(), CountingFactory::fresh());

    let result = engine
        .runner()
        .run_from_definition(&knowledge_only(), "What are the system requirements?", Default::default())
        .await;

    assert!(result.is_success());
    assert_eq!(result.response(), Some(REQUIREMENTS));
    let calls = knowledge.calls.lock();
    assert_eq!(calls[0].0, "What are the system requirements?");
    assert_eq!(calls[0].1.selected_bases, vec!["docs"]);
}

#[tokio::test]
async fn empty_query_is_reported_as_error_result() {
    let engine = engine_with(StubKnowledge::new(REQUIREMENTS), CountingFactory::fresh());

    let result = engine
        .runner()
        .run_from_definition(&knowledge_only(), "   ", Default::default())
        .await;

    assert!(!result.is_success());
    assert!(result.message().unwrap().contains("Query is required"));
}

#[tokio::test]
async fn compile_errors_become_error_results() {
    let engine = engine_with(StubKnowledge::new(""), CountingFactory::fresh());
    let definition = WorkflowDefinition::new(vec![NodeSpec::new("x", "teleporter")], vec![]);

    let result = engine
        .runner()
        .run_from_definition(&definition, "hello", Default::default())
        .await;

    assert_eq!(
        serde_json::to_value(&result).unwrap()["status"],
        json!("error")
    );
    assert!(result.message().unwrap().contains("unknown node type"));
}

#[tokio::test]
async fn chat_input_schema_gates_the_run() {
    let engine = engine_with(StubKnowledge::new(""), CountingFactory::fresh());
    let definition = WorkflowDefinition::from_value(json!({
        "nodes": [
            {
                "id": "in",
                "type": "chatInputNode",
                "data": { "inputSchema": { "customer_id": { "type": "string", "required": true } } }
            },
            { "id": "out", "type": "chatOutputNode", "data": { "template": "Echo: {query}" } }
        ],
        "edges": [{ "source": "in", "target": "out" }]
    }))
    .unwrap();

    let missing = engine
        .runner()
        .run_from_definition(&definition, "hi", Default::default())
        .await;
    assert!(missing.message().unwrap().contains("missing required input `customer_id`"));

    let ok = engine
        .runner()
        .run_from_definition(&definition, "hi", metadata(json!({ "customer_id": "c-42" })))
        .await;
    assert_eq!(ok.response(), Some("Echo: hi"));
}

#[tokio::test]
async fn knowledge_context_flows_into_downstream_agent() {
    let client = ScriptedClient::new(Vec::new());
    let engine = engine_with(StubKnowledge::new(REQUIREMENTS), CountingFactory::sharing(client.clone()));
    engine.start().await.unwrap();

    let definition = linear(vec![
        NodeSpec::new("in", "chat_input"),
        knowledge_node("kb"),
        agent_node("agent", json!({ "systemPrompt": "Support bot" })),
        NodeSpec::new("out", "chat_output"),
    ]);
    let result = engine
        .runner()
        .run_from_definition(&definition, "What are the system requirements?", Default::default())
        .await;

    assert!(result.is_success(), "{result:?}");
    let sent = client.last_request();
    let user = sent.last_user_message().unwrap();
    assert!(user.starts_with("I need information about: What are the system requirements?"));
    assert!(user.contains("RAM: 8GB minimum"));
    assert!(result.response().unwrap().starts_with("reply to: I need information about"));
}

#[tokio::test]
async fn soft_agent_failure_keeps_success_status_with_warning() {
    let client = ScriptedClient::new(vec![Err(EngineError::provider("upstream returned 503"))]);
    let engine = engine_with(StubKnowledge::new(""), CountingFactory::sharing(client));
    engine.start().await.unwrap();

    let definition = linear(vec![agent_node("agent", json!({})), NodeSpec::new("out", "chat_output")]);
    let result = engine
        .runner()
        .run_from_definition(&definition, "hello", Default::default())
        .await;

    assert!(result.is_success());
    assert_eq!(
        result.response(),
        Some("Agent failed to run query: provider error: upstream returned 503")
    );
    assert_eq!(result.warnings().len(), 1);
    assert!(result.warnings()[0].starts_with("agent: "));
}

#[tokio::test]
async fn client_construction_failure_is_fatal() {
    let engine = Engine::builder()
        .with_model_source(Arc::new(StaticModelConfigs::new(vec![ModelConfiguration::new(
            "bad", "echo", "broken",
        )])))
        .with_client_factory(CountingFactory::fresh())
        .build();
    engine.start().await.unwrap();

    let definition = WorkflowDefinition::new(vec![agent_node("agent", json!({}))], vec![]);
    let result = engine
        .runner()
        .run_from_definition(&definition, "hello", Default::default())
        .await;

    assert!(result.message().unwrap().contains("provider error"));
}

#[tokio::test]
async fn thread_id_comes_from_metadata() {
    let engine = engine_with(StubKnowledge::new(REQUIREMENTS), CountingFactory::fresh());

    let result = engine
        .runner()
        .run_from_definition(&knowledge_only(), "q", metadata(json!({ "session_id": "s-42" })))
        .await;

    match result {
        RunResult::Success { thread_id, agent_id, .. } => {
            assert_eq!(thread_id.as_deref(), Some("s-42"));
            assert!(agent_id.is_none());
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn registered_agents_run_by_id() {
    let repository = Arc::new(InMemoryAgentRepository::new(vec![AgentRecord::new("a1", "Docs")
        .with_workflow("wf", knowledge_only())]));
    let engine = Engine::builder()
        .with_model_source(echo_configs())
        .with_knowledge(StubKnowledge::new(REQUIREMENTS))
        .with_repository(repository)
        .build();
    assert!(!engine.is_ready());
    engine.start().await.unwrap();
    assert!(engine.is_ready());

    let result = engine
        .runner()
        .run("a1", "requirements?", metadata(json!({ "thread_id": "t-1" })))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({
            "status": "success",
            "response": REQUIREMENTS,
            "agent_id": "a1",
            "thread_id": "t-1"
        })
    );
}

#[tokio::test]
async fn unknown_or_inactive_agents_are_not_found() {
    let engine = engine_with(StubKnowledge::new(""), CountingFactory::fresh());
    engine
        .agents()
        .register_agent("retired", AgentRecord::new("retired", "Old").with_workflow("wf", knowledge_only()).inactive())
        .unwrap();

    for agent_id in ["missing", "retired"] {
        let err = engine.runner().run(agent_id, "hello", Default::default()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status_hint(), 404);
    }
}

#[tokio::test]
async fn sync_and_remove_follow_agent_lifecycle() {
    let engine = engine_with(StubKnowledge::new(REQUIREMENTS), CountingFactory::fresh());
    let record = AgentRecord::new("a1", "Docs").with_workflow("wf", knowledge_only());

    assert!(engine.sync_agent(record.clone()).unwrap().is_some());
    assert!(engine.runner().run("a1", "q", Default::default()).await.is_ok());

    assert!(engine.sync_agent(record.inactive()).unwrap().is_none());
    assert!(!engine.agents().is_initialized("a1"));
    assert!(!engine.remove_agent("a1"));
}

#[tokio::test]
async fn handle_rejects_blank_messages_before_running() {
    let engine = engine_with(StubKnowledge::new(REQUIREMENTS), CountingFactory::fresh());
    engine
        .agents()
        .register_agent("a1", AgentRecord::new("a1", "Docs").with_workflow("wf", knowledge_only()))
        .unwrap();

    let err = engine.runner().handle("a1", RunRequest::new("")).await.unwrap_err();
    assert!(err.is_configuration());

    let ok = engine.runner().handle("a1", RunRequest::new("q")).await.unwrap();
    assert!(ok.is_success());
}

#[tokio::test]
async fn shutdown_clears_registries() {
    let engine = engine_with(StubKnowledge::new(REQUIREMENTS), CountingFactory::fresh());
    engine.start().await.unwrap();
    engine
        .agents()
        .register_agent("a1", AgentRecord::new("a1", "Docs").with_workflow("wf", knowledge_only()))
        .unwrap();
    engine.models().get_model("default-model").unwrap();

    engine.shutdown();

    assert!(engine.agents().agent_ids().is_empty());
    assert_eq!(engine.models().cached_clients(), 0);
}
