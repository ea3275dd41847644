//! Conversation history handling
//!
//! History is an ordered list of `{role, content}` turns stored in the run
//! context under the memory sub-node's key. The agent reads the last
//! `windowSize` turns on entry and writes back at most `2 × windowSize`
//! turns on exit, newest last.

use flowgrid_core::RunContext;
use flowgrid_llm::ChatMessage;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

impl HistoryTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// Full stored history under `key`; malformed entries read as empty.
pub fn load_history(context: &RunContext, key: &str) -> Vec<HistoryTurn> {
    context
        .get(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// The trailing window carried into the model as prior messages.
pub fn window_messages(history: &[HistoryTurn], window_size: usize) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(window_size);
    history[start..]
        .iter()
        .map(|turn| match turn.role.as_str() {
            "assistant" => ChatMessage::assistant(turn.content.clone()),
            _ => ChatMessage::user(turn.content.clone()),
        })
        .collect()
}

/// Append the new exchange and trim to `2 × windowSize`, dropping the oldest
/// turns.
pub fn appended_and_trimmed(
    mut history: Vec<HistoryTurn>,
    user_prompt: &str,
    assistant_text: &str,
    window_size: usize,
) -> Vec<HistoryTurn> {
    history.push(HistoryTurn::user(user_prompt));
    history.push(HistoryTurn::assistant(assistant_text));
    let keep = 2 * window_size;
    if history.len() > keep {
        history.drain(..history.len() - keep);
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_keeps_newest_turns() {
        let mut history = Vec::new();
        for i in 1..=3 {
            history = appended_and_trimmed(history, &format!("p{i}"), &format!("a{i}"), 2);
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], HistoryTurn::user("p2"));
        assert_eq!(history[1], HistoryTurn::assistant("a2"));
        assert_eq!(history[2], HistoryTurn::user("p3"));
        assert_eq!(history[3], HistoryTurn::assistant("a3"));
    }

    #[test]
    fn window_takes_trailing_turns() {
        let history = vec![
            HistoryTurn::user("old"),
            HistoryTurn::assistant("older answer"),
            HistoryTurn::user("new"),
        ];
        let msgs = window_messages(&history, 2);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, "older answer");
        assert_eq!(msgs[1].content, "new");
    }

    #[test]
    fn malformed_history_reads_empty() {
        let mut ctx = RunContext::new();
        ctx.insert("chatHistory", serde_json::json!("not a list"));
        assert!(load_history(&ctx, "chatHistory").is_empty());
    }
}
