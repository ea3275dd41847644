//! HTTP request tool — lets the agent call an arbitrary endpoint

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use tracing::debug;

const MAX_RESPONSE_CHARS: usize = 5_000;
const ALLOWED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

pub struct HttpRequestTool {
    client: reqwest::Client,
    default_url: Option<String>,
    default_method: Option<String>,
    default_body: Option<String>,
}

impl HttpRequestTool {
    /// Defaults come from the tool sub-node's configuration; the model may
    /// override them per call.
    pub fn new(
        default_url: Option<String>,
        default_method: Option<String>,
        default_body: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            default_url,
            default_method,
            default_body,
        }
    }
}

#[async_trait::async_trait]
impl Tool for HttpRequestTool {
    fn name(&self) -> &str {
        "http_request"
    }

    fn description(&self) -> &str {
        "Make an HTTP request to a URL. Returns the response body (truncated to 5000 characters)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL to request"
                },
                "method": {
                    "type": "string",
                    "enum": ALLOWED_METHODS,
                    "description": "HTTP method (default GET)"
                },
                "body": {
                    "type": "string",
                    "description": "Optional request body (sent as JSON when parseable)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let url = match args
            .get("url")
            .and_then(|v| v.as_str())
            .or(self.default_url.as_deref())
        {
            Some(u) => u.to_string(),
            None => return ToolResult::error("Missing required parameter: url"),
        };

        let method = args
            .get("method")
            .and_then(|v| v.as_str())
            .or(self.default_method.as_deref())
            .unwrap_or("GET")
            .to_uppercase();
        if !ALLOWED_METHODS.contains(&method.as_str()) {
            return ToolResult::error(format!("Unsupported method: {method}"));
        }

        let body = args
            .get("body")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| self.default_body.clone());

        let mut request = match method.as_str() {
            "POST" => self.client.post(&url),
            "PUT" => self.client.put(&url),
            "PATCH" => self.client.patch(&url),
            "DELETE" => self.client.delete(&url),
            _ => self.client.get(&url),
        };
        if let Some(body) = body {
            request = match serde_json::from_str::<Value>(&body) {
                Ok(parsed) => request.json(&parsed),
                Err(_) => request.body(body),
            };
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("Request failed: {e}")),
        };
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let text = super::truncate_chars(&text, MAX_RESPONSE_CHARS);

        debug!(%url, %method, status = status.as_u16(), "http_request tool");
        ToolResult::text(format!("HTTP {}\n{}", status.as_u16(), text))
    }
}
