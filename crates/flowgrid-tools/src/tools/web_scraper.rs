//! Web scraper tool — fetch a page and reduce it to readable text

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};
use tracing::debug;

pub const DEFAULT_MAX_LENGTH: usize = 5_000;

pub struct WebScraperTool {
    client: reqwest::Client,
    max_length: usize,
}

impl WebScraperTool {
    pub fn new(max_length: Option<usize>) -> Self {
        Self {
            client: reqwest::Client::new(),
            max_length: max_length.unwrap_or(DEFAULT_MAX_LENGTH),
        }
    }
}

#[async_trait::async_trait]
impl Tool for WebScraperTool {
    fn name(&self) -> &str {
        "web_scraper"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its visible text with HTML removed."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL of the page to fetch"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let url = match args.get("url").and_then(|v| v.as_str()) {
            Some(u) => u,
            None => return ToolResult::error("Missing required parameter: url"),
        };

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return ToolResult::error(format!("Fetch failed: {e}")),
        };
        if !response.status().is_success() {
            return ToolResult::error(format!("Fetch failed: HTTP {}", response.status().as_u16()));
        }
        let html = response.text().await.unwrap_or_default();
        let text = strip_html(&html);
        debug!(%url, chars = text.len(), "web_scraper tool");
        ToolResult::text(super::truncate_chars(&text, self.max_length))
    }
}

/// Drop tags (including `<script>`/`<style>` bodies) and collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let lower_tail = tail.to_ascii_lowercase();

        // Skip the entire element body for non-content tags.
        let skipped = ["script", "style"].iter().find_map(|tag| {
            let is_tag = lower_tail.starts_with(tag)
                && !lower_tail[tag.len()..].starts_with(|c: char| c.is_ascii_alphanumeric());
            is_tag.then(|| {
                let close = format!("</{tag}");
                match lower_tail.find(&close) {
                    Some(end) => {
                        let after = &tail[end..];
                        after.find('>').map(|g| end + g + 1).unwrap_or(tail.len())
                    }
                    None => tail.len(),
                }
            })
        });
        rest = match skipped {
            Some(len) => &tail[len..],
            None => match tail.find('>') {
                Some(end) => &tail[end + 1..],
                None => "",
            },
        };
        // Tag boundaries separate words.
        out.push(' ');
    }
    out.push_str(rest);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<html><body><h1>Title</h1>\n\n  <p>Hello <b>world</b></p></body></html>";
        assert_eq!(strip_html(html), "Title Hello world");
    }

    #[test]
    fn drops_script_and_style_bodies() {
        let html = "<p>keep</p><script>var x = '<p>no</p>';</script><style>p { color: red }</style><p>also</p>";
        assert_eq!(strip_html(html), "keep also");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_html("just   text"), "just text");
    }
}
