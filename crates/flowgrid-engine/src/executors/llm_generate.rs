//! GEMINI / OPENAI / ANTHROPIC node executors
//!
//! One executor type registered three times, parameterised by provider. A
//! single completion per node; the provider call sits in a nested durable
//! step so retries of the run never re-bill the prompt.

use crate::registry::{ExecCtx, NodeExecutor};
use flowgrid_core::{template, Error, Result};
use flowgrid_llm::{ChatMessage, LlmRequest, Provider};
use serde_json::{json, Map, Value};
use tracing::debug;

pub struct LlmGenerateExecutor {
    provider: Provider,
}

impl LlmGenerateExecutor {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    async fn resolve_api_key(&self, ctx: &ExecCtx<'_>) -> Result<String> {
        if let Some(credential_id) = &ctx.node.credential_id {
            return ctx
                .services
                .credentials
                .decrypt_credential(&ctx.workflow.org_id, credential_id)
                .await;
        }
        // Provider-default keys may come from the environment, overridden by
        // per-credential keys above.
        std::env::var(self.provider.key_env_var()).map_err(|_| Error::MissingConfig {
            kind: ctx.node.kind,
            field: "credentialId",
        })
    }
}

#[async_trait::async_trait]
impl NodeExecutor for LlmGenerateExecutor {
    async fn execute(&self, ctx: ExecCtx<'_>) -> Result<Option<Map<String, Value>>> {
        let variable = ctx.node.variable_name()?.to_string();
        let prompt = template::render(ctx.node.require_str("prompt")?, ctx.context);
        let model = ctx
            .node
            .config_str("model")
            .unwrap_or(self.provider.default_model())
            .to_string();
        let system = ctx.node.config_str("systemPrompt").map(str::to_string);
        let api_key = self.resolve_api_key(&ctx).await?;

        let provider = ctx.services.providers.make(self.provider, &api_key);
        let text: String = ctx
            .step
            .run("generate", || async move {
                let request = LlmRequest {
                    model,
                    system,
                    messages: vec![ChatMessage::user(prompt)],
                    ..Default::default()
                };
                let response = provider
                    .complete(request)
                    .await
                    .map_err(|e| Error::Llm(e.to_string()))?;
                Ok(response.text)
            })
            .await?;

        debug!(node = %ctx.node.id, provider = self.provider.as_str(), "generation complete");

        let mut delta = Map::new();
        delta.insert(variable, json!({ "aiResponse": text }));
        Ok(Some(delta))
    }
}
