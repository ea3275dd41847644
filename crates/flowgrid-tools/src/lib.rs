//! Flowgrid tools — the capability catalogue the agent node exposes to its
//! LLM
//!
//! Each tool is a self-contained file in src/tools/. The agent builds a
//! per-invocation ToolRegistry from the tool sub-nodes wired to it; nothing
//! here is registered globally.

pub mod registry;
pub mod tools;

pub use registry::{Tool, ToolRegistry, ToolResult};
pub use tools::calculator::CalculatorTool;
pub use tools::http_request::HttpRequestTool;
pub use tools::inventory::{ListWarehousesTool, SearchProductsTool};
pub use tools::orders::{OrderStatsTool, SearchOrdersTool, UpdateOrderStatusTool};
pub use tools::passthrough::PassthroughTool;
pub use tools::send_email::{SendEmailTool, SmtpConfig};
pub use tools::web_scraper::WebScraperTool;
