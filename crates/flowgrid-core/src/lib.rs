//! Flowgrid core: graph data model, run context, template evaluator, status
//! bus, and the engine-wide error type.

pub mod context;
pub mod error;
pub mod status;
pub mod template;
pub mod types;

pub use context::{is_valid_variable_name, RunContext};
pub use error::{Error, Result};
pub use status::{StatusBus, StatusPublisher};
pub use types::{
    Connection, ExecuteWorkflow, HandleLabel, Node, NodeId, NodeKind, NodeStatus, OrgId, Position,
    RunId, StatusEvent, Workflow, WorkflowId, WorkflowStatus,
};
