//! Email tool — send through the sub-node's configured SMTP relay

use crate::registry::{Tool, ToolResult};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// SMTP settings from the SEND_EMAIL sub-node's `data`. The password is
/// encrypted at rest by the store; this struct only ever sees plaintext in
/// memory.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from_address: String,
    #[serde(default)]
    pub from_name: Option<String>,
}

fn default_port() -> u16 {
    587
}

pub struct SendEmailTool {
    config: SmtpConfig,
}

impl SendEmailTool {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn from_mailbox(&self) -> Result<Mailbox, String> {
        let raw = match &self.config.from_name {
            Some(name) => format!("{} <{}>", name, self.config.from_address),
            None => self.config.from_address.clone(),
        };
        raw.parse().map_err(|e| format!("Invalid from address: {e}"))
    }
}

#[async_trait::async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send an email via the configured SMTP account."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "Recipient email address"
                },
                "subject": {
                    "type": "string",
                    "description": "Email subject line"
                },
                "body": {
                    "type": "string",
                    "description": "Plain-text email body"
                }
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let to = match args.get("to").and_then(|v| v.as_str()) {
            Some(v) => v,
            None => return ToolResult::error("Missing required parameter: to"),
        };
        let subject = match args.get("subject").and_then(|v| v.as_str()) {
            Some(v) => v,
            None => return ToolResult::error("Missing required parameter: subject"),
        };
        let body = match args.get("body").and_then(|v| v.as_str()) {
            Some(v) => v,
            None => return ToolResult::error("Missing required parameter: body"),
        };

        let from = match self.from_mailbox() {
            Ok(m) => m,
            Err(e) => return ToolResult::error(e),
        };
        let to_mailbox: Mailbox = match to.parse() {
            Ok(m) => m,
            Err(e) => return ToolResult::error(format!("Invalid recipient address: {e}")),
        };

        let message = match Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .body(body.to_string())
        {
            Ok(m) => m,
            Err(e) => return ToolResult::error(format!("Could not build message: {e}")),
        };

        let transport = match AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host) {
            Ok(builder) => builder
                .port(self.config.port)
                .credentials(Credentials::new(
                    self.config.user.clone(),
                    self.config.pass.clone(),
                ))
                .build(),
            Err(e) => return ToolResult::error(format!("SMTP configuration error: {e}")),
        };

        match transport.send(message).await {
            Ok(_) => {
                debug!(%to, "send_email tool");
                ToolResult::text(format!("Email sent to {to}"))
            }
            Err(e) => ToolResult::error(format!("SMTP send failed: {e}")),
        }
    }
}
