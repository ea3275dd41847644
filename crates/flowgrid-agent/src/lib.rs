//! Flowgrid agent: the AI_AGENT node executor
//!
//! At run time the agent discovers its locally connected sub-nodes (model,
//! memory, tools) by edge label, compiles them into a bounded tool-calling
//! loop over the chosen LLM, and writes the answer and trimmed conversation
//! history back into the shared context.

pub mod memory;
pub mod subnodes;
pub mod toolset;

use flowgrid_core::{template, Error, Node, NodeStatus, Result, StatusPublisher};
use flowgrid_engine::{ExecCtx, NodeExecutor};
use flowgrid_llm::{ChatMessage, LlmProvider, LlmRequest, Provider, ToolDef};
use flowgrid_tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use subnodes::{AgentWiring, MemorySettings};
use tracing::{debug, info};

const DEFAULT_MAX_ITERATIONS: u64 = 10;
const MAX_ITERATIONS_BOUND: u64 = 25;

/// What one agent invocation produced. Memoised by the enclosing durable
/// step, so it must round-trip through JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct AgentOutcome {
    response: String,
    tool_call_count: u32,
}

pub struct AgentExecutor;

#[async_trait::async_trait]
impl NodeExecutor for AgentExecutor {
    async fn execute(&self, ctx: ExecCtx<'_>) -> Result<Option<Map<String, Value>>> {
        let variable = ctx.node.variable_name()?.to_string();
        let prompt = template::render(ctx.node.require_str("userPrompt")?, ctx.context);
        let system = ctx.node.config_str("systemPrompt").map(str::to_string);
        let max_iterations = ctx
            .node
            .config_u64("maxIterations")
            .unwrap_or(DEFAULT_MAX_ITERATIONS)
            .clamp(1, MAX_ITERATIONS_BOUND);

        let wiring = subnodes::discover(ctx.workflow, &ctx.node.id);
        let memory_settings = wiring.memory.map(MemorySettings::from_node);

        // Visual feedback: the discovered sub-nodes light up and settle
        // together with the agent.
        publish_fan_out(ctx.publish, &wiring, NodeStatus::Loading);
        let result = self
            .run_loop(&ctx, &wiring, &memory_settings, prompt.clone(), system, max_iterations)
            .await;
        let terminal = if result.is_ok() {
            NodeStatus::Success
        } else {
            NodeStatus::Error
        };
        publish_fan_out(ctx.publish, &wiring, terminal);
        let outcome = result?;

        info!(
            node = %ctx.node.id,
            tool_calls = outcome.tool_call_count,
            "agent finished"
        );

        let mut delta = Map::new();
        delta.insert(
            variable,
            json!({
                "agentResponse": outcome.response,
                "toolCallCount": outcome.tool_call_count,
            }),
        );
        if let Some(settings) = memory_settings {
            let history = memory::appended_and_trimmed(
                memory::load_history(ctx.context, &settings.memory_key),
                &prompt,
                &outcome.response,
                settings.window_size,
            );
            delta.insert(settings.memory_key, serde_json::to_value(history)?);
        }
        Ok(Some(delta))
    }
}

impl AgentExecutor {
    async fn run_loop(
        &self,
        ctx: &ExecCtx<'_>,
        wiring: &AgentWiring<'_>,
        memory_settings: &Option<MemorySettings>,
        prompt: String,
        system: Option<String>,
        max_iterations: u64,
    ) -> Result<AgentOutcome> {
        let model_node = wiring.model.ok_or(Error::AgentMissingModel(ctx.node.id.clone()))?;
        if model_node.config_str("provider").is_none() && model_node.credential_id.is_none() {
            return Err(Error::AgentMissingModel(ctx.node.id.clone()));
        }

        let provider_kind = Provider::parse(model_node.config_str("provider").unwrap_or(""));
        let model = model_node
            .config_str("model")
            .filter(|m| !m.is_empty())
            .unwrap_or(provider_kind.default_model())
            .to_string();
        let api_key = resolve_api_key(ctx, model_node, provider_kind).await?;
        let provider = ctx.services.providers.make(provider_kind, &api_key);

        let prior_messages = match memory_settings {
            Some(settings) => memory::window_messages(
                &memory::load_history(ctx.context, &settings.memory_key),
                settings.window_size,
            ),
            None => Vec::new(),
        };

        let tools = toolset::build_registry(&wiring.tools, ctx.services, &ctx.workflow.org_id)?;
        debug!(node = %ctx.node.id, tools = ?tools.list(), %model, "agent assembled");

        // One durable step wraps the whole loop: provider calls and tool
        // side effects are never repeated on replay.
        ctx.step
            .run("agent", || {
                generation_loop(
                    provider,
                    tools,
                    model,
                    system,
                    prior_messages,
                    prompt,
                    max_iterations,
                )
            })
            .await
    }
}

async fn resolve_api_key(
    ctx: &ExecCtx<'_>,
    model_node: &Node,
    provider: Provider,
) -> Result<String> {
    if let Some(credential_id) = &model_node.credential_id {
        return ctx
            .services
            .credentials
            .decrypt_credential(&ctx.workflow.org_id, credential_id)
            .await
            .map_err(|_| Error::AgentMissingKey(ctx.node.id.clone()));
    }
    std::env::var(provider.key_env_var())
        .map_err(|_| Error::AgentMissingKey(ctx.node.id.clone()))
}

async fn generation_loop(
    provider: Arc<dyn LlmProvider>,
    tools: ToolRegistry,
    model: String,
    system: Option<String>,
    prior_messages: Vec<ChatMessage>,
    prompt: String,
    max_iterations: u64,
) -> Result<AgentOutcome> {
    let tool_defs: Vec<ToolDef> = tools.definitions();
    let mut messages = prior_messages;
    messages.push(ChatMessage::user(prompt));

    let mut tool_call_count: u32 = 0;
    let mut last_text = String::new();

    for iteration in 1..=max_iterations {
        let request = LlmRequest {
            model: model.clone(),
            system: system.clone(),
            messages: messages.clone(),
            tools: tool_defs.clone(),
            ..Default::default()
        };
        let response = provider
            .complete(request)
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        if !response.text.is_empty() {
            last_text = response.text.clone();
        }

        if !response.has_tool_calls() {
            debug!(iteration, "agent reached terminal text");
            return Ok(AgentOutcome {
                response: response.text,
                tool_call_count,
            });
        }

        messages.push(ChatMessage::assistant_with_tools(
            response.text,
            response.tool_calls.clone(),
        ));
        for call in response.tool_calls {
            tool_call_count += 1;
            let result = tools.execute(&call.name, call.arguments).await;
            debug!(tool = %call.name, error = result.is_error(), "tool executed");
            messages.push(ChatMessage::tool_result(
                call.id,
                call.name,
                result.to_content_string(),
            ));
        }
    }

    // Step count reached without a terminal text; surface whatever the
    // model said last.
    Ok(AgentOutcome {
        response: last_text,
        tool_call_count,
    })
}

fn publish_fan_out(publisher: &StatusPublisher, wiring: &AgentWiring<'_>, status: NodeStatus) {
    for sub in wiring.sub_nodes() {
        publisher.publish_for(sub.id.clone(), sub.kind, status);
    }
}
