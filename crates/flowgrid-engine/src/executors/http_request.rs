//! HTTP_REQUEST node executor

use crate::registry::{ExecCtx, NodeExecutor};
use flowgrid_core::{template, Error, Result};
use serde_json::{json, Map, Value};
use tracing::debug;

const ALLOWED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Performs one HTTP call and writes
/// `{httpResponse: {status, statusText, data}}` under the node's variable
/// name. Non-2xx statuses are data, not failures; only transport errors
/// fail the node.
pub struct RequestExecutor;

#[async_trait::async_trait]
impl NodeExecutor for RequestExecutor {
    async fn execute(&self, ctx: ExecCtx<'_>) -> Result<Option<Map<String, Value>>> {
        let variable = ctx.node.variable_name()?.to_string();
        let url = template::render(ctx.node.require_str("url")?, ctx.context);
        let method = ctx
            .node
            .config_str("method")
            .unwrap_or("GET")
            .to_uppercase();
        if !ALLOWED_METHODS.contains(&method.as_str()) {
            return Err(Error::MissingConfig {
                kind: ctx.node.kind,
                field: "method",
            });
        }
        let body = ctx
            .node
            .config_str("body")
            .map(|raw| template::render(raw, ctx.context));

        let client = ctx.services.http.clone();
        let response: Value = ctx
            .step
            .run("http", || async move {
                let mut request = match method.as_str() {
                    "POST" => client.post(&url),
                    "PUT" => client.put(&url),
                    "PATCH" => client.patch(&url),
                    "DELETE" => client.delete(&url),
                    _ => client.get(&url),
                };
                if let Some(body) = body {
                    request = match serde_json::from_str::<Value>(&body) {
                        Ok(parsed) => request.json(&parsed),
                        Err(_) => request.body(body),
                    };
                }

                let response = request
                    .send()
                    .await
                    .map_err(|e| Error::Http(e.to_string()))?;
                let status = response.status();
                let is_json = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v.contains("json"));
                let text = response
                    .text()
                    .await
                    .map_err(|e| Error::Http(e.to_string()))?;
                let data = if is_json {
                    serde_json::from_str(&text).unwrap_or(Value::String(text))
                } else {
                    Value::String(text)
                };

                debug!(status = status.as_u16(), %url, "http request executed");
                Ok(json!({
                    "status": status.as_u16(),
                    "statusText": status.canonical_reason().unwrap_or(""),
                    "data": data,
                }))
            })
            .await?;

        let mut delta = Map::new();
        delta.insert(variable, json!({ "httpResponse": response }));
        Ok(Some(delta))
    }
}
