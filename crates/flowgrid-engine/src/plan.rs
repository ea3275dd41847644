//! Planner: turns a stored graph into the ordered list of nodes to execute.
//!
//! Only main-flow edges participate. The plan is the trigger-reachable
//! sub-graph in topological order; unreachable nodes are silently ignored.
//! `plan` is a pure function of the workflow: node ids break ties, so the
//! same input always yields the same order.

use flowgrid_core::{Error, NodeId, Result, Workflow};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionPlan {
    pub nodes: Vec<NodeId>,
}

impl ExecutionPlan {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

pub fn plan(workflow: &Workflow) -> Result<ExecutionPlan> {
    let known: BTreeSet<&NodeId> = workflow.nodes.iter().map(|n| &n.id).collect();

    // Connection endpoints must refer to nodes of this workflow, sub-node
    // edges included.
    for connection in &workflow.connections {
        if !known.contains(&connection.from_node) || !known.contains(&connection.to_node) {
            return Err(Error::OrphanConnection(connection.id.clone()));
        }
    }

    let main_edges: Vec<(&NodeId, &NodeId)> = workflow
        .connections
        .iter()
        .filter(|c| c.is_main())
        .map(|c| (&c.from_node, &c.to_node))
        .collect();

    let triggers: BTreeSet<&NodeId> = workflow
        .nodes
        .iter()
        .filter(|n| n.kind.is_trigger())
        .map(|n| &n.id)
        .collect();
    if triggers.is_empty() {
        // No trigger: the run is a no-op.
        return Ok(ExecutionPlan::default());
    }

    let mut adjacency: BTreeMap<&NodeId, Vec<&NodeId>> = BTreeMap::new();
    for &(from, to) in &main_edges {
        adjacency.entry(from).or_default().push(to);
    }

    // Reachable set, breadth-first from every trigger.
    let mut reachable: BTreeSet<&NodeId> = BTreeSet::new();
    let mut queue: VecDeque<&NodeId> = triggers.iter().copied().collect();
    while let Some(current) = queue.pop_front() {
        if !reachable.insert(current) {
            continue;
        }
        if let Some(next) = adjacency.get(current) {
            queue.extend(next.iter().copied());
        }
    }

    // Kahn's algorithm over the induced sub-graph; the ready set is ordered
    // by node id so the sort is deterministic.
    let mut in_degree: BTreeMap<&NodeId, usize> =
        reachable.iter().map(|id| (*id, 0)).collect();
    for &(from, to) in &main_edges {
        if reachable.contains(from) && reachable.contains(to) {
            *in_degree.get_mut(to).expect("reachable node") += 1;
        }
    }

    let mut ready: BTreeSet<&NodeId> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order: Vec<NodeId> = Vec::with_capacity(reachable.len());

    while let Some(current) = ready.iter().next().copied() {
        ready.remove(current);
        order.push(current.clone());
        if let Some(next) = adjacency.get(current) {
            for to in next.iter().copied() {
                if let Some(degree) = in_degree.get_mut(to) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(to);
                    }
                }
            }
        }
    }

    if order.len() != reachable.len() {
        return Err(Error::PlanCycle(workflow.id.clone()));
    }
    Ok(ExecutionPlan { nodes: order })
}
