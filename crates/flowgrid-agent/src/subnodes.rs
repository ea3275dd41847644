//! Sub-node discovery: the agent's star-shaped local sub-graph
//!
//! Coupling is by edge label, not node position. At most one chat-model and
//! one memory sub-node are honoured; extras are ignored in id order. Tool
//! sub-nodes are unbounded.

use flowgrid_core::{HandleLabel, Node, NodeId, Workflow};

#[derive(Default)]
pub struct AgentWiring<'a> {
    pub model: Option<&'a Node>,
    pub memory: Option<&'a Node>,
    pub tools: Vec<&'a Node>,
}

impl<'a> AgentWiring<'a> {
    /// Every discovered sub-node, for status fan-out.
    pub fn sub_nodes(&self) -> Vec<&'a Node> {
        let mut out = Vec::new();
        out.extend(self.model);
        out.extend(self.memory);
        out.extend(self.tools.iter().copied());
        out
    }
}

pub fn discover<'a>(workflow: &'a Workflow, agent_id: &NodeId) -> AgentWiring<'a> {
    let mut wiring = AgentWiring::default();
    let mut edges: Vec<_> = workflow.connections_into(agent_id).collect();
    // Id order keeps duplicate-label resolution and tool ordering stable.
    edges.sort_by(|a, b| a.from_node.cmp(&b.from_node));

    for edge in edges {
        let Some(source) = workflow.node(&edge.from_node) else {
            continue;
        };
        match edge.input_label() {
            HandleLabel::ChatModel => {
                wiring.model.get_or_insert(source);
            }
            HandleLabel::Memory => {
                wiring.memory.get_or_insert(source);
            }
            HandleLabel::Tool => wiring.tools.push(source),
            HandleLabel::Main | HandleLabel::Other(_) => {}
        }
    }
    wiring
}

/// Memory sub-node settings with the documented defaults.
#[derive(Clone, Debug)]
pub struct MemorySettings {
    pub window_size: usize,
    pub memory_key: String,
}

impl MemorySettings {
    pub const DEFAULT_WINDOW_SIZE: usize = 10;
    pub const DEFAULT_MEMORY_KEY: &'static str = "chatHistory";

    pub fn from_node(node: &Node) -> Self {
        Self {
            window_size: node
                .config_u64("windowSize")
                .map(|w| w as usize)
                .unwrap_or(Self::DEFAULT_WINDOW_SIZE),
            memory_key: node
                .config_str("memoryKey")
                .filter(|k| !k.is_empty())
                .unwrap_or(Self::DEFAULT_MEMORY_KEY)
                .to_string(),
        }
    }
}
