//! DISCORD / SLACK node executors — post a templated message to an incoming
//! webhook

use crate::registry::{ExecCtx, NodeExecutor};
use flowgrid_core::{template, Error, Result};
use serde_json::{json, Map, Value};
use tracing::debug;

enum Flavor {
    Discord,
    Slack,
}

pub struct WebhookMessageExecutor {
    flavor: Flavor,
}

impl WebhookMessageExecutor {
    pub fn discord() -> Self {
        Self {
            flavor: Flavor::Discord,
        }
    }

    pub fn slack() -> Self {
        Self {
            flavor: Flavor::Slack,
        }
    }
}

#[async_trait::async_trait]
impl NodeExecutor for WebhookMessageExecutor {
    async fn execute(&self, ctx: ExecCtx<'_>) -> Result<Option<Map<String, Value>>> {
        let variable = ctx.node.variable_name()?.to_string();
        let webhook_url = ctx.node.require_str("webhookUrl")?.to_string();
        let content = template::render(ctx.node.require_str("content")?, ctx.context);

        // Same message, different envelope key per service.
        let body = match self.flavor {
            Flavor::Discord => json!({ "content": content.clone() }),
            Flavor::Slack => json!({ "text": content.clone() }),
        };

        let client = ctx.services.http.clone();
        let sent: String = ctx
            .step
            .run("post", || async move {
                let response = client
                    .post(&webhook_url)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| Error::Http(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Http(format!("webhook returned {status}")));
                }
                debug!(status = status.as_u16(), "webhook message posted");
                Ok(content)
            })
            .await?;

        let mut delta = Map::new();
        delta.insert(variable, json!({ "messageContent": sent }));
        Ok(Some(delta))
    }
}
