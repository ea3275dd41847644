//! Run driver: walks the plan sequentially, threads the context, wraps each
//! node in a durable step, and emits lifecycle status events.

use crate::plan::plan;
use crate::registry::{EngineServices, ExecCtx, ExecutorRegistry};
use crate::step::{StepHandle, StepJournal};
use flowgrid_core::{
    Error, NodeStatus, Result, RunContext, RunId, StatusBus, Workflow,
};
use std::sync::Arc;
use tracing::{error, info};

pub struct RunDriver {
    registry: Arc<ExecutorRegistry>,
    journal: Arc<dyn StepJournal>,
    bus: Arc<StatusBus>,
    services: Arc<EngineServices>,
}

impl RunDriver {
    pub fn new(
        registry: Arc<ExecutorRegistry>,
        journal: Arc<dyn StepJournal>,
        bus: Arc<StatusBus>,
        services: Arc<EngineServices>,
    ) -> Self {
        Self {
            registry,
            journal,
            bus,
            services,
        }
    }

    pub fn bus(&self) -> &Arc<StatusBus> {
        &self.bus
    }

    /// Execute one run to completion. Nodes run strictly sequentially:
    /// `finish(node_i)` happens-before `start(node_i+1)`.
    ///
    /// Planning failures surface before any status event. Re-driving a run
    /// id against the same journal skips already-completed nodes and
    /// reproduces the same final context.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        run_id: &RunId,
        initial: RunContext,
    ) -> Result<RunContext> {
        let plan = plan(workflow)?;
        info!(run = %run_id, workflow = %workflow.id, nodes = plan.len(), "run started");

        let publisher = self.bus.publisher(run_id.clone());
        let root_step = StepHandle::new(self.journal.clone(), run_id.clone());
        let mut context = initial;

        for node_id in &plan.nodes {
            let node = workflow
                .node(node_id)
                .ok_or_else(|| Error::internal(format!("planned node {node_id} missing")))?;

            publisher.publish(node, NodeStatus::Loading);

            let executor = match self.registry.get(node.kind) {
                Some(executor) => executor,
                None => {
                    publisher.publish(node, NodeStatus::Error);
                    return Err(Error::UnknownNodeKind(node.kind));
                }
            };

            let step = root_step.scoped(&format!("node:{node_id}"));
            let ctx = ExecCtx {
                node,
                workflow,
                context: &context,
                step: step.clone(),
                publish: &publisher,
                services: &self.services,
            };

            // The whole node is one durable step; a replayed run merges the
            // memoised delta without re-entering the executor.
            let delta = step
                .run("result", || async { executor.execute(ctx).await })
                .await;

            match delta {
                Ok(Some(delta)) => {
                    context = context.merged_with(delta);
                    publisher.publish(node, NodeStatus::Success);
                }
                Ok(None) => {
                    publisher.publish(node, NodeStatus::Success);
                }
                Err(e) => {
                    // Terminal status here; the error itself propagates
                    // verbatim so the host step runtime sees the failure.
                    error!(run = %run_id, node = %node_id, "node failed: {e}");
                    publisher.publish(node, NodeStatus::Error);
                    return Err(e);
                }
            }
        }

        info!(run = %run_id, "run finished");
        Ok(context)
    }
}
