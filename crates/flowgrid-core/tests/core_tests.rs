//! Tests for flowgrid-core: graph types, handle labels, status bus ordering

use flowgrid_core::*;
use serde_json::json;

fn node(id: &str, kind: NodeKind) -> Node {
    Node {
        id: NodeId::new(id),
        kind,
        position: Position::default(),
        data: serde_json::Map::new(),
        credential_id: None,
    }
}

// ===========================================================================
// NodeKind
// ===========================================================================

#[test]
fn node_kind_serde_wire_names() {
    assert_eq!(serde_json::to_string(&NodeKind::AiAgent).unwrap(), "\"AI_AGENT\"");
    assert_eq!(serde_json::to_string(&NodeKind::HttpRequest).unwrap(), "\"HTTP_REQUEST\"");
    let parsed: NodeKind = serde_json::from_str("\"GOOGLE_FORM_TRIGGER\"").unwrap();
    assert_eq!(parsed, NodeKind::GoogleFormTrigger);
}

#[test]
fn trigger_kinds() {
    assert!(NodeKind::Initial.is_trigger());
    assert!(NodeKind::ManualTrigger.is_trigger());
    assert!(NodeKind::GoogleFormTrigger.is_trigger());
    assert!(NodeKind::StripeTrigger.is_trigger());
    assert!(!NodeKind::HttpRequest.is_trigger());
    assert!(!NodeKind::AiAgent.is_trigger());
}

// ===========================================================================
// Handle labels
// ===========================================================================

#[test]
fn main_flow_aliases() {
    for raw in [None, Some(""), Some("main"), Some("target-1")] {
        assert_eq!(HandleLabel::parse(raw), HandleLabel::Main, "alias {raw:?}");
    }
}

#[test]
fn sub_node_labels() {
    assert_eq!(HandleLabel::parse(Some("chat-model-target")), HandleLabel::ChatModel);
    assert_eq!(HandleLabel::parse(Some("memory-target")), HandleLabel::Memory);
    assert_eq!(HandleLabel::parse(Some("tool-target")), HandleLabel::Tool);
    assert_eq!(
        HandleLabel::parse(Some("mystery")),
        HandleLabel::Other("mystery".into())
    );
}

// ===========================================================================
// Node configuration
// ===========================================================================

#[test]
fn missing_required_field_names_kind_and_field() {
    let n = node("h1", NodeKind::HttpRequest);
    let err = n.require_str("url").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("HTTP_REQUEST"), "{msg}");
    assert!(msg.contains("url"), "{msg}");
    assert!(!err.is_retriable());
}

#[test]
fn variable_name_is_validated() {
    let mut n = node("h1", NodeKind::HttpRequest);
    n.data.insert("variableName".into(), json!("2bad"));
    assert!(matches!(n.variable_name(), Err(Error::InvalidVariableName(_))));
    n.data.insert("variableName".into(), json!("r"));
    assert_eq!(n.variable_name().unwrap(), "r");
}

// ===========================================================================
// Status bus
// ===========================================================================

#[tokio::test]
async fn status_events_are_fifo_per_subscriber() {
    let bus = StatusBus::new();
    let run = RunId::new("run-1");
    let mut rx = bus.subscribe(&run);
    let publisher = bus.publisher(run.clone());

    let n = node("a", NodeKind::ManualTrigger);
    publisher.publish(&n, NodeStatus::Loading);
    publisher.publish(&n, NodeStatus::Success);

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.status, NodeStatus::Loading);
    assert_eq!(second.status, NodeStatus::Success);
    assert_eq!(first.node_id, n.id);
    assert_eq!(first.workflow_run_id, run);
}

#[tokio::test]
async fn topics_are_isolated_per_run() {
    let bus = StatusBus::new();
    let run_a = RunId::new("run-a");
    let run_b = RunId::new("run-b");
    let mut rx_b = bus.subscribe(&run_b);

    let publisher = bus.publisher(run_a);
    publisher.publish(&node("a", NodeKind::Initial), NodeStatus::Loading);

    // Nothing crosses topics.
    assert!(matches!(
        rx_b.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn publishing_without_subscribers_is_fine() {
    let bus = StatusBus::new();
    let publisher = bus.publisher(RunId::new("run-quiet"));
    publisher.publish(&node("a", NodeKind::Initial), NodeStatus::Loading);
    publisher.publish(&node("a", NodeKind::Initial), NodeStatus::Success);
}

// ===========================================================================
// Execute event payload
// ===========================================================================

#[test]
fn execute_event_wire_format() {
    let payload: ExecuteWorkflow =
        serde_json::from_value(json!({"workflowId": "wf-1", "initialData": {"seed": 1}}))
            .unwrap();
    assert_eq!(payload.workflow_id.as_str(), "wf-1");
    assert_eq!(payload.initial_data.unwrap()["seed"], json!(1));
}
