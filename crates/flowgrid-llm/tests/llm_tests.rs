//! Tests for flowgrid-llm: chat types and the scripted mock provider

#![cfg(feature = "mock")]

use flowgrid_llm::mock::{MockBehavior, MockFactory, MockProvider};
use flowgrid_llm::*;
use serde_json::json;
use std::sync::Arc;

// ===========================================================================
// Chat types
// ===========================================================================

#[test]
fn tool_result_message_carries_id_and_name() {
    let msg = ChatMessage::tool_result("call-0", "calculator", "15");
    assert_eq!(msg.role, Role::Tool);
    assert_eq!(msg.tool_call_id.as_deref(), Some("call-0"));
    assert_eq!(msg.tool_name.as_deref(), Some("calculator"));
    assert_eq!(msg.content, "15");
}

#[test]
fn assistant_with_tools_keeps_call_order() {
    let msg = ChatMessage::assistant_with_tools(
        "",
        vec![
            ToolCall { id: "call-0".into(), name: "a".into(), arguments: json!({}) },
            ToolCall { id: "call-1".into(), name: "b".into(), arguments: json!({}) },
        ],
    );
    assert_eq!(msg.tool_calls[0].name, "a");
    assert_eq!(msg.tool_calls[1].name, "b");
}

// ===========================================================================
// Mock provider
// ===========================================================================

#[tokio::test]
async fn mock_sequence_is_consumed_in_order() {
    let mock = MockProvider::sequence(vec![
        MockBehavior::ToolCall { name: "calculator".into(), args: json!({"expression": "1+1"}) },
        MockBehavior::Text("2".into()),
    ]);

    let first = mock.complete(LlmRequest::default()).await.unwrap();
    assert!(first.has_tool_calls());
    assert_eq!(first.tool_calls[0].name, "calculator");
    assert_eq!(first.stop_reason, StopReason::ToolUse);

    let second = mock.complete(LlmRequest::default()).await.unwrap();
    assert!(!second.has_tool_calls());
    assert_eq!(second.text, "2");

    // Exhausted sequences fall back to the default text.
    let third = mock.complete(LlmRequest::default()).await.unwrap();
    assert!(third.text.contains("exhausted"));
    assert_eq!(mock.call_count().await, 3);
}

#[tokio::test]
async fn mock_records_requests() {
    let mock = MockProvider::constant(MockBehavior::Text("ok".into()));
    let request = LlmRequest {
        model: "gemini-2.0-flash".into(),
        messages: vec![ChatMessage::user("hello")],
        ..Default::default()
    };
    mock.complete(request).await.unwrap();

    let seen = mock.requests().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].model, "gemini-2.0-flash");
    assert_eq!(seen[0].messages[0].content, "hello");
}

#[tokio::test]
async fn mock_factory_ignores_backend_and_key() {
    let mock = Arc::new(MockProvider::constant(MockBehavior::Text("same".into())));
    let factory = MockFactory::new(mock.clone());
    let a = factory.make(Provider::Gemini, "key-a");
    let b = factory.make(Provider::Anthropic, "key-b");
    assert_eq!(a.complete(LlmRequest::default()).await.unwrap().text, "same");
    assert_eq!(b.complete(LlmRequest::default()).await.unwrap().text, "same");
    assert_eq!(mock.call_count().await, 2);
}

#[tokio::test]
async fn mock_error_behavior_surfaces_as_llm_error() {
    let mock = MockProvider::constant(MockBehavior::Error("boom".into()));
    let err = mock.complete(LlmRequest::default()).await.unwrap_err();
    assert!(matches!(err, LlmError::RequestFailed(_)));
}
