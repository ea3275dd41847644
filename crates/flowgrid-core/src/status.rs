//! Status channel: a named pub/sub bus carrying per-node lifecycle events.
//!
//! One topic per run. Delivery is at-least-once from the engine's viewpoint
//! and per-subscriber FIFO (tokio broadcast). Token issuance for subscribers
//! lives in the gateway; the engine only publishes.

use crate::types::{Node, NodeId, NodeKind, NodeStatus, RunId, StatusEvent};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

const TOPIC_CAPACITY: usize = 256;

/// Registry of per-run status topics.
#[derive(Default)]
pub struct StatusBus {
    topics: DashMap<RunId, broadcast::Sender<StatusEvent>>,
}

impl StatusBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn topic(&self, run_id: &RunId) -> broadcast::Sender<StatusEvent> {
        self.topics
            .entry(run_id.clone())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }

    /// Publisher bound to one run's topic. Each run owns exactly one.
    pub fn publisher(&self, run_id: RunId) -> StatusPublisher {
        let tx = self.topic(&run_id);
        StatusPublisher { run_id, tx }
    }

    pub fn subscribe(&self, run_id: &RunId) -> broadcast::Receiver<StatusEvent> {
        self.topic(run_id).subscribe()
    }

    /// Drop a finished run's topic. Existing receivers drain and then see
    /// `Closed`.
    pub fn close(&self, run_id: &RunId) {
        self.topics.remove(run_id);
    }
}

#[derive(Clone)]
pub struct StatusPublisher {
    run_id: RunId,
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusPublisher {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn publish(&self, node: &Node, status: NodeStatus) {
        self.publish_for(node.id.clone(), node.kind, status);
    }

    /// Fan-out form used by the agent for its sub-node ids.
    pub fn publish_for(&self, node_id: NodeId, node_kind: NodeKind, status: NodeStatus) {
        let event = StatusEvent {
            workflow_run_id: self.run_id.clone(),
            node_id,
            node_kind,
            status,
        };
        debug!(run = %event.workflow_run_id, node = %event.node_id, status = ?status, "status");
        // No subscribers is fine; the run does not depend on the UI.
        let _ = self.tx.send(event);
    }
}
