//! Tests for flowgrid-agent: sub-node discovery, the tool loop, memory
//! trimming, tenancy, and status fan-out

use chrono::Utc;
use flowgrid_agent::AgentExecutor;
use flowgrid_core::*;
use flowgrid_engine::{EngineServices, ExecutorRegistry, MemoryJournal, RunDriver};
use flowgrid_llm::mock::{MockBehavior, MockFactory, MockProvider};
use flowgrid_llm::Role;
use flowgrid_store::{CredentialKind, CredentialVault, MemoryStore, Order, OrderStatus};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;

const KEY: &str = "99887766554433221100ffeeddccbbaa99887766554433221100ffeeddccbbaa";

fn node(id: &str, kind: NodeKind, data: Value) -> Node {
    Node {
        id: NodeId::new(id),
        kind,
        position: Position::default(),
        data: data.as_object().cloned().unwrap_or_default(),
        credential_id: None,
    }
}

fn conn(id: &str, from: &str, to: &str, to_input: &str) -> Connection {
    Connection {
        id: id.into(),
        from_node: NodeId::new(from),
        to_node: NodeId::new(to),
        from_output: None,
        to_input: if to_input.is_empty() {
            None
        } else {
            Some(to_input.into())
        },
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    mock: Arc<MockProvider>,
    driver: RunDriver,
}

fn harness(behaviors: Vec<MockBehavior>) -> Harness {
    harness_with(Arc::new(MockProvider::sequence(behaviors)))
}

fn harness_with(mock: Arc<MockProvider>) -> Harness {
    let store = Arc::new(MemoryStore::new(CredentialVault::from_hex_key(KEY).unwrap()));
    store
        .insert_credential("cred-g", OrgId::new("org-1"), CredentialKind::Gemini, "g", "sk-g")
        .unwrap();
    let services = Arc::new(EngineServices {
        credentials: store.clone(),
        inventory: store.clone(),
        orders: store.clone(),
        providers: Arc::new(MockFactory::new(mock.clone())),
        http: reqwest::Client::new(),
    });
    let mut registry = ExecutorRegistry::builtin();
    registry.register(NodeKind::AiAgent, AgentExecutor);
    let driver = RunDriver::new(
        Arc::new(registry),
        Arc::new(MemoryJournal::new()),
        Arc::new(StatusBus::new()),
        services,
    );
    Harness { store, mock, driver }
}

/// Trigger → agent, with the given sub-nodes attached by edge label.
fn agent_workflow(agent_data: Value, sub_nodes: Vec<(Node, &str)>) -> Workflow {
    let mut nodes = vec![
        node("t", NodeKind::ManualTrigger, json!({})),
        node("agent", NodeKind::AiAgent, agent_data),
    ];
    let mut connections = vec![conn("c-main", "t", "agent", "main")];
    for (i, (sub, label)) in sub_nodes.into_iter().enumerate() {
        connections.push(conn(
            &format!("c-sub-{i}"),
            sub.id.as_str(),
            "agent",
            label,
        ));
        nodes.push(sub);
    }
    Workflow {
        id: WorkflowId::new("wf-agent"),
        org_id: OrgId::new("org-1"),
        name: "agent test".into(),
        description: None,
        status: WorkflowStatus::Active,
        nodes,
        connections,
    }
}

fn chat_model_node() -> Node {
    let mut n = node("model", NodeKind::ChatModel, json!({"provider": "gemini"}));
    n.credential_id = Some("cred-g".into());
    n
}

// ===========================================================================
// Tool loop
// ===========================================================================

#[tokio::test]
async fn calculator_loop_answers_with_tool_result() {
    let h = harness(vec![
        MockBehavior::ToolCall {
            name: "calculator".into(),
            args: json!({"expression": "sqrt(144) + 3"}),
        },
        MockBehavior::Text("The answer is 15.".into()),
    ]);
    let wf = agent_workflow(
        json!({
            "variableName": "agent",
            "userPrompt": "what is sqrt(144) + 3?",
            "maxIterations": 3,
        }),
        vec![
            (chat_model_node(), "chat-model-target"),
            (node("calc", NodeKind::Calculator, json!({})), "tool-target"),
        ],
    );

    let out = h
        .driver
        .execute(&wf, &RunId::new("run-1"), RunContext::new())
        .await
        .unwrap();

    let response = out.get_path("agent.agentResponse").unwrap().as_str().unwrap();
    assert!(response.contains("15"), "{response}");
    assert!(out.get_path("agent.toolCallCount").unwrap().as_u64().unwrap() >= 1);

    // The second request carried the tool result back to the model.
    let requests = h.mock.requests().await;
    assert_eq!(requests.len(), 2);
    let last = requests[1].messages.last().unwrap();
    assert_eq!(last.role, Role::Tool);
    assert_eq!(last.content, "15");
    assert_eq!(last.tool_name.as_deref(), Some("calculator"));
}

#[tokio::test]
async fn single_iteration_without_tools_is_one_llm_call() {
    let h = harness(vec![MockBehavior::Text("done".into())]);
    let wf = agent_workflow(
        json!({
            "variableName": "agent",
            "userPrompt": "just answer",
            "maxIterations": 1,
        }),
        vec![(chat_model_node(), "chat-model-target")],
    );

    let out = h
        .driver
        .execute(&wf, &RunId::new("run-2"), RunContext::new())
        .await
        .unwrap();

    assert_eq!(h.mock.call_count().await, 1);
    assert_eq!(out.get_path("agent.agentResponse"), Some(&json!("done")));
    assert_eq!(out.get_path("agent.toolCallCount"), Some(&json!(0)));
    // No tools wired: the model saw none.
    assert!(h.mock.requests().await[0].tools.is_empty());
}

#[tokio::test]
async fn iteration_bound_caps_llm_calls() {
    // The model insists on calling tools forever; the bound stops it.
    let h = harness_with(Arc::new(MockProvider::constant(MockBehavior::ToolCall {
        name: "calculator".into(),
        args: json!({"expression": "1+1"}),
    })));

    let wf = agent_workflow(
        json!({
            "variableName": "agent",
            "userPrompt": "loop forever",
            "maxIterations": 3,
        }),
        vec![
            (chat_model_node(), "chat-model-target"),
            (node("calc", NodeKind::Calculator, json!({})), "tool-target"),
        ],
    );

    let out = h
        .driver
        .execute(&wf, &RunId::new("run-3"), RunContext::new())
        .await
        .unwrap();
    assert_eq!(h.mock.call_count().await, 3);
    assert_eq!(out.get_path("agent.toolCallCount"), Some(&json!(3)));
}

// ===========================================================================
// Tenancy
// ===========================================================================

#[tokio::test]
async fn cross_tenant_order_update_is_rejected_by_the_tool() {
    let h = harness(vec![
        MockBehavior::ToolCall {
            name: "update_order_status".into(),
            args: json!({"orderId": 42, "newStatus": "shipped"}),
        },
        MockBehavior::Text("I could not update order 42: it does not exist.".into()),
    ]);
    // Order 42 belongs to another organization.
    h.store.insert_order(Order {
        id: 42,
        org_id: OrgId::new("org-2"),
        customer_email: None,
        status: OrderStatus::Pending,
        total_cents: 100,
        created_at: Utc::now(),
    });

    let wf = agent_workflow(
        json!({
            "variableName": "agent",
            "userPrompt": "mark order 42 shipped",
            "maxIterations": 3,
        }),
        vec![
            (chat_model_node(), "chat-model-target"),
            (node("orders", NodeKind::OrderManager, json!({})), "tool-target"),
        ],
    );

    let out = h
        .driver
        .execute(&wf, &RunId::new("run-4"), RunContext::new())
        .await
        .unwrap();

    // The tool reported the failure to the model...
    let requests = h.mock.requests().await;
    let tool_result = requests[1].messages.last().unwrap();
    assert!(
        tool_result.content.starts_with("Error: Order #42 not found"),
        "{}",
        tool_result.content
    );
    // ...the final answer reflects it, and no write occurred.
    let response = out.get_path("agent.agentResponse").unwrap().as_str().unwrap();
    assert!(response.contains("not"), "{response}");
    assert_eq!(h.store.order(42).unwrap().status, OrderStatus::Pending);
}

// ===========================================================================
// Memory
// ===========================================================================

#[tokio::test]
async fn memory_trims_to_twice_the_window() {
    let h = harness(vec![
        MockBehavior::Text("a1".into()),
        MockBehavior::Text("a2".into()),
        MockBehavior::Text("a3".into()),
    ]);
    let wf = agent_workflow(
        json!({
            "variableName": "agent",
            "userPrompt": "{{p}}",
        }),
        vec![
            (chat_model_node(), "chat-model-target"),
            (
                node("mem", NodeKind::Memory, json!({"windowSize": 2})),
                "memory-target",
            ),
        ],
    );

    let mut context = RunContext::new();
    for (i, prompt) in ["p1", "p2", "p3"].iter().enumerate() {
        context.insert("p", json!(prompt));
        context = h
            .driver
            .execute(&wf, &RunId::new(format!("run-mem-{i}")), context)
            .await
            .unwrap();
    }

    let history = context.get("chatHistory").unwrap().as_array().unwrap();
    assert_eq!(history.len(), 4);
    let contents: Vec<&str> = history
        .iter()
        .map(|t| t["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["p2", "a2", "p3", "a3"]);
    assert_eq!(history[2]["role"], json!("user"));
    assert_eq!(history[3]["role"], json!("assistant"));

    // The third call saw the trailing window as prior messages.
    let third = &h.mock.requests().await[2];
    let contents: Vec<String> = third.messages.iter().map(|m| m.content.clone()).collect();
    assert_eq!(contents, vec!["p2", "a2", "p3"]);
}

// ===========================================================================
// Configuration failures
// ===========================================================================

#[tokio::test]
async fn missing_model_sub_node_is_non_retriable() {
    let h = harness(vec![]);
    let wf = agent_workflow(
        json!({"variableName": "agent", "userPrompt": "hi"}),
        vec![],
    );

    let err = h
        .driver
        .execute(&wf, &RunId::new("run-5"), RunContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AgentMissingModel(_)));
    assert!(!err.is_retriable());
    assert_eq!(h.mock.call_count().await, 0);
}

#[tokio::test]
async fn undecryptable_credential_is_missing_key() {
    let h = harness(vec![]);
    let mut model = node("model", NodeKind::ChatModel, json!({"provider": "gemini"}));
    model.credential_id = Some("cred-unknown".into());
    let wf = agent_workflow(
        json!({"variableName": "agent", "userPrompt": "hi"}),
        vec![(model, "chat-model-target")],
    );

    let err = h
        .driver
        .execute(&wf, &RunId::new("run-6"), RunContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AgentMissingKey(_)));
    assert!(!err.is_retriable());
}

// ===========================================================================
// Status fan-out
// ===========================================================================

#[tokio::test]
async fn sub_nodes_share_the_agent_lifecycle() {
    let h = harness(vec![MockBehavior::Text("ok".into())]);
    let wf = agent_workflow(
        json!({"variableName": "agent", "userPrompt": "hi"}),
        vec![
            (chat_model_node(), "chat-model-target"),
            (node("mem", NodeKind::Memory, json!({})), "memory-target"),
            (node("calc", NodeKind::Calculator, json!({})), "tool-target"),
        ],
    );

    let run = RunId::new("run-7");
    let mut rx = h.driver.bus().subscribe(&run);
    h.driver.execute(&wf, &run, RunContext::new()).await.unwrap();

    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(e) => events.push((e.node_id.to_string(), e.status)),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }

    // Exactly one loading and one terminal per node id, loading first.
    for id in ["agent", "model", "mem", "calc"] {
        let of_node: Vec<NodeStatus> = events
            .iter()
            .filter(|(n, _)| n == id)
            .map(|(_, s)| *s)
            .collect();
        assert_eq!(of_node, vec![NodeStatus::Loading, NodeStatus::Success], "node {id}");
    }
}

// ===========================================================================
// Durable replay
// ===========================================================================

#[tokio::test]
async fn replay_skips_the_generation_step() {
    let h = harness(vec![MockBehavior::Text("memoised".into())]);
    let wf = agent_workflow(
        json!({"variableName": "agent", "userPrompt": "hi"}),
        vec![(chat_model_node(), "chat-model-target")],
    );

    let run = RunId::new("run-8");
    let first = h.driver.execute(&wf, &run, RunContext::new()).await.unwrap();
    assert_eq!(h.mock.call_count().await, 1);

    let second = h.driver.execute(&wf, &run, RunContext::new()).await.unwrap();
    assert_eq!(h.mock.call_count().await, 1);
    assert_eq!(first, second);
}
