//! Tool assembly: turn the agent's tool sub-nodes into a ToolRegistry
//!
//! Each sub-node kind maps to one or more named tools. INVENTORY_LOOKUP and
//! ORDER_MANAGER expose several tools from a single node; unrecognised
//! kinds become a pass-through echo tool.

use flowgrid_core::{Node, NodeKind, OrgId, Result};
use flowgrid_engine::EngineServices;
use flowgrid_tools::{
    CalculatorTool, HttpRequestTool, ListWarehousesTool, OrderStatsTool, PassthroughTool,
    SearchOrdersTool, SearchProductsTool, SendEmailTool, SmtpConfig, ToolRegistry,
    UpdateOrderStatusTool, WebScraperTool,
};
use tracing::debug;

pub fn build_registry(
    tool_nodes: &[&Node],
    services: &EngineServices,
    org: &OrgId,
) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for node in tool_nodes {
        match node.kind {
            NodeKind::HttpRequest => registry.register(HttpRequestTool::new(
                node.config_str("url").map(str::to_string),
                node.config_str("method").map(str::to_string),
                node.config_str("body").map(str::to_string),
            )),
            NodeKind::SendEmail => registry.register(SendEmailTool::new(smtp_config(node)?)),
            NodeKind::WebScraper => registry.register(WebScraperTool::new(
                node.config_u64("maxLength").map(|m| m as usize),
            )),
            NodeKind::Calculator => registry.register(CalculatorTool),
            NodeKind::InventoryLookup => {
                registry.register(SearchProductsTool::new(
                    services.inventory.clone(),
                    org.clone(),
                ));
                registry.register(ListWarehousesTool::new(
                    services.inventory.clone(),
                    org.clone(),
                ));
            }
            NodeKind::OrderManager => {
                registry.register(SearchOrdersTool::new(services.orders.clone(), org.clone()));
                registry.register(UpdateOrderStatusTool::new(
                    services.orders.clone(),
                    org.clone(),
                ));
                registry.register(OrderStatsTool::new(services.orders.clone(), org.clone()));
            }
            other => {
                debug!(node = %node.id, kind = %other, "no tool adapter, exposing pass-through");
                registry.register(PassthroughTool::new(
                    passthrough_name(node),
                    format!("Pass-through tool for the {other} node; echoes its input."),
                ));
            }
        }
    }
    Ok(registry)
}

fn passthrough_name(node: &Node) -> String {
    let sanitized: String = node
        .id
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("passthrough_{sanitized}")
}

fn smtp_config(node: &Node) -> Result<SmtpConfig> {
    Ok(SmtpConfig {
        host: node.require_str("host")?.to_string(),
        port: node.config_u64("port").map(|p| p as u16).unwrap_or(587),
        user: node.require_str("user")?.to_string(),
        pass: node.require_str("pass")?.to_string(),
        from_address: node.require_str("fromAddress")?.to_string(),
        from_name: node.config_str("fromName").map(str::to_string),
    })
}
