//! Engine-wide error type with the retriability split the run driver and
//! durable step runtime rely on.

use crate::types::{NodeId, NodeKind, WorkflowId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{kind} node is missing required field `{field}`")]
    MissingConfig {
        kind: NodeKind,
        field: &'static str,
    },

    #[error("invalid variable name `{0}`")]
    InvalidVariableName(String),

    #[error("no executor registered for node kind {0}")]
    UnknownNodeKind(NodeKind),

    #[error("workflow {0} has a cycle in its main-flow edges")]
    PlanCycle(WorkflowId),

    #[error("connection `{0}` references a node outside the workflow")]
    OrphanConnection(String),

    #[error("agent node {0} has no chat-model sub-node attached")]
    AgentMissingModel(NodeId),

    #[error("agent node {0} has no usable API key")]
    AgentMissingKey(NodeId),

    #[error("credential not found")]
    CredentialNotFound,

    #[error("Order #{0} not found")]
    OrderNotFound(i64),

    #[error("workflow not found: {0}")]
    WorkflowNotFound(WorkflowId),

    #[error("http error: {0}")]
    Http(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("smtp error: {0}")]
    Smtp(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// External I/O may be retried by the host step runtime (its default
    /// policy is zero retries). Configuration, planning, tenancy, and
    /// decryption failures abort the run outright.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Llm(_) | Error::Smtp(_) | Error::Store(_)
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
