//! Trigger executors
//!
//! Triggers only start a plan. Their payloads (manual seed data, Google Form
//! answers, Stripe events) are already in the initial context by the time
//! the run begins, so execution is a pass-through.

use crate::registry::{ExecCtx, NodeExecutor};
use flowgrid_core::Result;
use serde_json::{Map, Value};

pub struct TriggerExecutor;

#[async_trait::async_trait]
impl NodeExecutor for TriggerExecutor {
    async fn execute(&self, _ctx: ExecCtx<'_>) -> Result<Option<Map<String, Value>>> {
        Ok(None)
    }
}
