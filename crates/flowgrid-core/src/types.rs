//! Core graph types for Flowgrid

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(Arc::from(s.into()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                Ok(Self::new(String::deserialize(deserializer)?))
            }
        }
    };
}

id_newtype! {
    /// Organization identifier. Opaque: no assumptions about its shape or
    /// numeric range.
    OrgId
}

id_newtype! {
    /// Workflow identifier - cheaply cloneable
    WorkflowId
}

id_newtype! {
    /// Node identifier, unique within a workflow
    NodeId
}

id_newtype! {
    /// Run identifier, minted per execution
    RunId
}

impl RunId {
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Node kind - closed set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Initial,
    ManualTrigger,
    HttpRequest,
    GoogleFormTrigger,
    StripeTrigger,
    Gemini,
    Anthropic,
    Openai,
    Discord,
    Slack,
    AiAgent,
    ChatModel,
    Memory,
    SendEmail,
    WebScraper,
    Calculator,
    InventoryLookup,
    OrderManager,
}

impl NodeKind {
    /// Trigger kinds start a plan; everything reachable from them executes.
    pub fn is_trigger(&self) -> bool {
        matches!(
            self,
            NodeKind::Initial
                | NodeKind::ManualTrigger
                | NodeKind::GoogleFormTrigger
                | NodeKind::StripeTrigger
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Initial => "INITIAL",
            NodeKind::ManualTrigger => "MANUAL_TRIGGER",
            NodeKind::HttpRequest => "HTTP_REQUEST",
            NodeKind::GoogleFormTrigger => "GOOGLE_FORM_TRIGGER",
            NodeKind::StripeTrigger => "STRIPE_TRIGGER",
            NodeKind::Gemini => "GEMINI",
            NodeKind::Anthropic => "ANTHROPIC",
            NodeKind::Openai => "OPENAI",
            NodeKind::Discord => "DISCORD",
            NodeKind::Slack => "SLACK",
            NodeKind::AiAgent => "AI_AGENT",
            NodeKind::ChatModel => "CHAT_MODEL",
            NodeKind::Memory => "MEMORY",
            NodeKind::SendEmail => "SEND_EMAIL",
            NodeKind::WebScraper => "WEB_SCRAPER",
            NodeKind::Calculator => "CALCULATOR",
            NodeKind::InventoryLookup => "INVENTORY_LOOKUP",
            NodeKind::OrderManager => "ORDER_MANAGER",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection handle label. Stored graphs carry these as free strings; the
/// aliases below keep older graphs loadable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandleLabel {
    /// Participates in scheduling (`""`, `"main"`, `"target-1"`).
    Main,
    /// Chat-model sub-node of an agent (`"chat-model-target"`).
    ChatModel,
    /// Memory sub-node of an agent (`"memory-target"`).
    Memory,
    /// Tool sub-node of an agent (`"tool-target"`).
    Tool,
    /// Anything else; ignored by the planner, opaque to the engine.
    Other(String),
}

impl HandleLabel {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("") {
            "" | "main" | "target-1" => HandleLabel::Main,
            "chat-model" | "chat-model-target" => HandleLabel::ChatModel,
            "memory" | "memory-target" => HandleLabel::Memory,
            "tool" | "tool-target" => HandleLabel::Tool,
            other => HandleLabel::Other(other.to_string()),
        }
    }
}

/// 2-D editor coordinate. Opaque to the engine; round-tripped for the UI.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A vertex in a workflow graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
    /// Free-form configuration, interpreted per kind.
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
}

impl Node {
    pub fn config_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }

    pub fn config_u64(&self, field: &str) -> Option<u64> {
        self.data.get(field).and_then(|v| v.as_u64())
    }

    /// Missing required fields are configuration errors: non-retriable, and
    /// the message names both the kind and the field.
    pub fn require_str(&self, field: &'static str) -> Result<&str> {
        self.config_str(field).ok_or(Error::MissingConfig {
            kind: self.kind,
            field,
        })
    }

    /// The user-chosen output key. Validated here so a bad binding surfaces
    /// as a configuration error before any work happens.
    pub fn variable_name(&self) -> Result<&str> {
        let name = self.require_str("variableName")?;
        if !crate::context::is_valid_variable_name(name) {
            return Err(Error::InvalidVariableName(name.to_string()));
        }
        Ok(name)
    }
}

/// A labeled edge between two nodes of the same workflow.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    #[serde(rename = "fromNodeId")]
    pub from_node: NodeId,
    #[serde(rename = "toNodeId")]
    pub to_node: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_input: Option<String>,
}

impl Connection {
    pub fn input_label(&self) -> HandleLabel {
        HandleLabel::parse(self.to_input.as_deref())
    }

    pub fn is_main(&self) -> bool {
        self.input_label() == HandleLabel::Main
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

/// A named graph owned by an organization.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: WorkflowId,
    pub org_id: OrgId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Workflow {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Connections pointing at `id`, regardless of label. Executors that
    /// consume sub-node edges partition the result themselves.
    pub fn connections_into(&self, id: &NodeId) -> impl Iterator<Item = &Connection> + '_ {
        let id = id.clone();
        self.connections.iter().filter(move |c| c.to_node == id)
    }
}

/// Per-node lifecycle status carried on the status channel.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Loading,
    Success,
    Error,
}

/// One record on a run's status topic.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub workflow_run_id: RunId,
    pub node_id: NodeId,
    pub node_kind: NodeKind,
    pub status: NodeStatus,
}

/// Payload of the `workflows/execute.workflow` event.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteWorkflow {
    pub workflow_id: WorkflowId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_data: Option<Map<String, Value>>,
}
