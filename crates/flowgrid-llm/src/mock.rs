//! MockProvider — deterministic completions for testing
//!
//! Returns canned responses that exercise specific tool calls. Each call to
//! `complete` pops the next behavior; an exhausted sequence returns a
//! default text response.

use crate::provider::{LlmError, LlmProvider, LlmResult};
use crate::types::{LlmRequest, LlmResponse, StopReason, ToolCall};
use crate::{Provider, ProviderFactory};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock behavior configuration
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Return a text-only response
    Text(String),
    /// Return a single tool call with given name and args
    ToolCall { name: String, args: Value },
    /// Return multiple tool calls in one response
    MultiToolCall(Vec<(String, Value)>),
    /// Return an error
    Error(String),
}

pub struct MockProvider {
    behaviors: Mutex<Vec<MockBehavior>>,
    default_behavior: MockBehavior,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    /// A mock that always returns the same behavior
    pub fn constant(behavior: MockBehavior) -> Self {
        Self {
            behaviors: Mutex::new(Vec::new()),
            default_behavior: behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A mock with a sequence of behaviors, consumed in order
    pub fn sequence(behaviors: Vec<MockBehavior>) -> Self {
        Self {
            behaviors: Mutex::new(behaviors),
            default_behavior: MockBehavior::Text("(mock: sequence exhausted)".into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Requests seen so far, in call order.
    pub async fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_behavior(&self) -> MockBehavior {
        let mut behaviors = self.behaviors.lock().await;
        if behaviors.is_empty() {
            self.default_behavior.clone()
        } else {
            behaviors.remove(0)
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: LlmRequest) -> LlmResult<LlmResponse> {
        self.requests.lock().await.push(request);
        match self.next_behavior().await {
            MockBehavior::Text(text) => Ok(LlmResponse {
                text,
                stop_reason: StopReason::EndTurn,
                ..Default::default()
            }),
            MockBehavior::ToolCall { name, args } => Ok(LlmResponse {
                tool_calls: vec![ToolCall {
                    id: "call-0".into(),
                    name,
                    arguments: args,
                }],
                stop_reason: StopReason::ToolUse,
                ..Default::default()
            }),
            MockBehavior::MultiToolCall(calls) => Ok(LlmResponse {
                tool_calls: calls
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, args))| ToolCall {
                        id: format!("call-{i}"),
                        name,
                        arguments: args,
                    })
                    .collect(),
                stop_reason: StopReason::ToolUse,
                ..Default::default()
            }),
            MockBehavior::Error(message) => Err(LlmError::RequestFailed(message)),
        }
    }
}

/// A factory that hands out the same scripted provider regardless of the
/// requested backend or key.
pub struct MockFactory {
    provider: Arc<MockProvider>,
}

impl MockFactory {
    pub fn new(provider: Arc<MockProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<MockProvider> {
        &self.provider
    }
}

impl ProviderFactory for MockFactory {
    fn make(&self, _provider: Provider, _api_key: &str) -> Arc<dyn LlmProvider> {
        self.provider.clone()
    }
}
