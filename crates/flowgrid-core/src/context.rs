//! Run context: the mapping from variable name to result value threaded
//! through one run.
//!
//! Node kinds do not get their own static context types; the context is a
//! JSON value tree with a small dotted-path resolver on top, shared with the
//! template evaluator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output keys must be valid identifiers. Checked at configuration time.
pub fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// The value context for one run. Owned exclusively by its run; never
/// crosses run boundaries.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RunContext(Map<String, Value>);

impl RunContext {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Dotted lookup, e.g. `r.httpResponse.data.id`. Numeric segments index
    /// into arrays. Missing segments resolve to `None`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Union of this context with `delta`, `delta` winning on key clashes.
    /// The result is always a superset of `self` key-wise; executors return
    /// deltas and the driver merges, so nothing is ever deleted mid-run.
    pub fn merged_with(&self, delta: Map<String, Value>) -> RunContext {
        let mut out = self.0.clone();
        for (k, v) in delta {
            out.insert(k, v);
        }
        RunContext(out)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for RunContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variable_names() {
        assert!(is_valid_variable_name("r"));
        assert!(is_valid_variable_name("_private"));
        assert!(is_valid_variable_name("$ctx"));
        assert!(is_valid_variable_name("agentResponse2"));
        assert!(!is_valid_variable_name(""));
        assert!(!is_valid_variable_name("2fast"));
        assert!(!is_valid_variable_name("has space"));
        assert!(!is_valid_variable_name("dash-ed"));
    }

    #[test]
    fn path_resolution() {
        let mut ctx = RunContext::new();
        ctx.insert("r", json!({"httpResponse": {"data": {"id": "abc", "tags": ["x", "y"]}}}));
        assert_eq!(
            ctx.get_path("r.httpResponse.data.id"),
            Some(&json!("abc"))
        );
        assert_eq!(ctx.get_path("r.httpResponse.data.tags.1"), Some(&json!("y")));
        assert_eq!(ctx.get_path("r.missing.deep"), None);
        assert_eq!(ctx.get_path("absent"), None);
    }

    #[test]
    fn merge_is_superset() {
        let mut ctx = RunContext::new();
        ctx.insert("a", json!(1));
        let mut delta = Map::new();
        delta.insert("b".into(), json!(2));
        let merged = ctx.merged_with(delta);
        assert_eq!(merged.get("a"), Some(&json!(1)));
        assert_eq!(merged.get("b"), Some(&json!(2)));
        assert_eq!(merged.len(), 2);
    }
}
