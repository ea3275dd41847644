//! Template evaluator: `{{path.to.value}}` substitution against the run
//! context.
//!
//! Two recognised forms: a dotted lookup stringified with JSON scalar rules,
//! and `{{json path}}` for a pretty-printed subtree. Unknown paths evaluate
//! to the empty string. Templates never execute code, and nothing is
//! HTML-escaped: output feeds JSON bodies and prompts, not markup.

use crate::context::RunContext;
use serde_json::Value;

/// Render `input`, substituting every `{{...}}` placeholder from `ctx`.
/// Unterminated braces are passed through verbatim.
pub fn render(input: &str, ctx: &RunContext) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                out.push_str(&evaluate(after[..end].trim(), ctx));
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn evaluate(expr: &str, ctx: &RunContext) -> String {
    if let Some(path) = expr.strip_prefix("json ") {
        return match ctx.get_path(path.trim()) {
            Some(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
            None => String::new(),
        };
    }
    match ctx.get_path(expr) {
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> RunContext {
        let mut ctx = RunContext::new();
        ctx.insert(
            "r",
            json!({"httpResponse": {"status": 200, "data": {"id": "abc", "ok": true}}}),
        );
        ctx.insert("name", json!("Ada"));
        ctx
    }

    #[test]
    fn plain_substitution() {
        assert_eq!(render("hello {{name}}!", &ctx()), "hello Ada!");
    }

    #[test]
    fn scalar_rules_match_json() {
        // Strings are raw; numbers, booleans, and null print as JSON scalars.
        assert_eq!(render("{{r.httpResponse.status}}", &ctx()), "200");
        assert_eq!(render("{{r.httpResponse.data.ok}}", &ctx()), "true");
        assert_eq!(render("{{r.httpResponse.data.id}}", &ctx()), "abc");
    }

    #[test]
    fn unknown_paths_are_empty() {
        assert_eq!(render("[{{nope.deep}}]", &ctx()), "[]");
    }

    #[test]
    fn json_form_pretty_prints() {
        let rendered = render("{{json r.httpResponse.data}}", &ctx());
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, json!({"id": "abc", "ok": true}));
    }

    #[test]
    fn templated_json_body() {
        let body = render("{\"id\":\"{{r.httpResponse.data.id}}\"}", &ctx());
        assert_eq!(body, "{\"id\":\"abc\"}");
    }

    #[test]
    fn unterminated_braces_pass_through() {
        assert_eq!(render("a {{name", &ctx()), "a {{name");
    }
}
