//! Node executor contract and registry

use crate::step::StepHandle;
use flowgrid_core::{Node, NodeKind, Result, RunContext, StatusPublisher, Workflow};
use flowgrid_llm::ProviderFactory;
use flowgrid_store::{CredentialStore, InventoryStore, OrderStore};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared capabilities handed to every executor. One instance per process;
/// everything in it is safe to use from concurrent runs.
pub struct EngineServices {
    pub credentials: Arc<dyn CredentialStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub orders: Arc<dyn OrderStore>,
    pub providers: Arc<dyn ProviderFactory>,
    pub http: reqwest::Client,
}

/// Everything an executor sees for one node invocation.
///
/// `context` is a read-only snapshot; executors return their new keys and
/// the driver merges, so the input mapping is never mutated in place.
pub struct ExecCtx<'a> {
    pub node: &'a Node,
    pub workflow: &'a Workflow,
    pub context: &'a RunContext,
    /// Scoped to this node; nested steps land under `node:{id}/...`.
    pub step: StepHandle,
    pub publish: &'a StatusPublisher,
    pub services: &'a EngineServices,
}

/// An executor for one node kind.
///
/// Obligations: validate required configuration up front (non-retriable,
/// naming kind and field), resolve templated fields against the context,
/// run external calls inside nested steps, and write the result under the
/// node's variable name in the returned delta. `None` keeps the context
/// unchanged.
#[async_trait::async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(&self, ctx: ExecCtx<'_>) -> Result<Option<Map<String, Value>>>;
}

/// Kind → executor mapping. A lookup miss fails the run with
/// `UnknownNodeKind`.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<NodeKind, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in main-flow executors. Sub-node kinds (chat model, memory,
    /// tools) stay unregistered: they configure the agent and never run on
    /// the main flow.
    pub fn builtin() -> Self {
        use crate::executors::{
            LlmGenerateExecutor, RequestExecutor, TriggerExecutor, WebhookMessageExecutor,
        };
        use flowgrid_llm::Provider;

        let mut registry = Self::new();
        let trigger = Arc::new(TriggerExecutor);
        for kind in [
            NodeKind::Initial,
            NodeKind::ManualTrigger,
            NodeKind::GoogleFormTrigger,
            NodeKind::StripeTrigger,
        ] {
            registry.register_arc(kind, trigger.clone());
        }
        registry.register(NodeKind::HttpRequest, RequestExecutor);
        registry.register(NodeKind::Gemini, LlmGenerateExecutor::new(Provider::Gemini));
        registry.register(NodeKind::Openai, LlmGenerateExecutor::new(Provider::OpenAi));
        registry.register(
            NodeKind::Anthropic,
            LlmGenerateExecutor::new(Provider::Anthropic),
        );
        registry.register(NodeKind::Discord, WebhookMessageExecutor::discord());
        registry.register(NodeKind::Slack, WebhookMessageExecutor::slack());
        registry
    }

    pub fn register(&mut self, kind: NodeKind, executor: impl NodeExecutor + 'static) {
        self.register_arc(kind, Arc::new(executor));
    }

    pub fn register_arc(&mut self, kind: NodeKind, executor: Arc<dyn NodeExecutor>) {
        self.executors.insert(kind, executor);
    }

    pub fn get(&self, kind: NodeKind) -> Option<Arc<dyn NodeExecutor>> {
        self.executors.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<NodeKind> {
        self.executors.keys().copied().collect()
    }
}
