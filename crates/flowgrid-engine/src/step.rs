//! Durable step runtime interface
//!
//! The host guarantees that a named step within a run executes at most once
//! on success, with its result memoised across retries of the enclosing run.
//! The engine consumes that guarantee through `StepHandle`; tests and the
//! single-process binary use the in-memory journal. Executors must perform
//! LLM calls and external I/O only inside steps.

use dashmap::DashMap;
use flowgrid_core::{Result, RunId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Storage for memoised step results, keyed `(run, step name)`.
#[async_trait::async_trait]
pub trait StepJournal: Send + Sync {
    async fn get(&self, run_id: &RunId, step: &str) -> Option<Value>;
    async fn put(&self, run_id: &RunId, step: &str, value: Value);
}

/// In-memory journal. Also the test double: seed it, drive a run, inspect
/// which steps were recorded.
#[derive(Default)]
pub struct MemoryJournal {
    entries: DashMap<(RunId, String), Value>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, run_id: &RunId, step: &str) -> bool {
        self.entries.contains_key(&(run_id.clone(), step.to_string()))
    }
}

#[async_trait::async_trait]
impl StepJournal for MemoryJournal {
    async fn get(&self, run_id: &RunId, step: &str) -> Option<Value> {
        self.entries
            .get(&(run_id.clone(), step.to_string()))
            .map(|v| v.clone())
    }

    async fn put(&self, run_id: &RunId, step: &str, value: Value) {
        self.entries.insert((run_id.clone(), step.to_string()), value);
    }
}

/// A run-scoped handle for executing named steps. Nesting appends path
/// segments, so `node:h1` and `node:h1/http` never collide.
#[derive(Clone)]
pub struct StepHandle {
    journal: Arc<dyn StepJournal>,
    run_id: RunId,
    scope: String,
}

impl StepHandle {
    pub fn new(journal: Arc<dyn StepJournal>, run_id: RunId) -> Self {
        Self {
            journal,
            run_id,
            scope: String::new(),
        }
    }

    /// A handle whose step names live under `scope`.
    pub fn scoped(&self, scope: &str) -> StepHandle {
        StepHandle {
            journal: self.journal.clone(),
            run_id: self.run_id.clone(),
            scope: self.qualify(scope),
        }
    }

    fn qualify(&self, name: &str) -> String {
        if self.scope.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.scope, name)
        }
    }

    /// Run `f` unless the journal already holds a success for this step, in
    /// which case the memoised value is returned and `f` is never invoked.
    /// Failures are not memoised; a replayed run re-enters the step.
    pub async fn run<T, F, Fut>(&self, name: &str, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let step = self.qualify(name);
        if let Some(memoised) = self.journal.get(&self.run_id, &step).await {
            debug!(run = %self.run_id, %step, "step memoised, skipping");
            return Ok(serde_json::from_value(memoised)?);
        }
        let value = f().await?;
        self.journal
            .put(&self.run_id, &step, serde_json::to_value(&value)?)
            .await;
        Ok(value)
    }
}
