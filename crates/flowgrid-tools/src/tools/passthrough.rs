//! Pass-through tool — echoes its input; stands in for sub-node kinds with
//! no dedicated adapter

use crate::registry::{Tool, ToolResult};
use serde_json::{json, Value};

pub struct PassthroughTool {
    name: String,
    description: String,
}

impl PassthroughTool {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for PassthroughTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": "Arbitrary input; echoed back unchanged"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        ToolResult::Json(args)
    }
}
