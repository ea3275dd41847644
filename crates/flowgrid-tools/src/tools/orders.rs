//! Order tools — search, status updates, and aggregate stats, scoped to the
//! agent's owning organization. Status updates against another tenant's
//! orders fail exactly like updates against missing orders.

use crate::registry::{Tool, ToolResult};
use flowgrid_core::{Error, OrgId};
use flowgrid_store::{OrderStatus, OrderStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;

pub struct SearchOrdersTool {
    store: Arc<dyn OrderStore>,
    org: OrgId,
}

impl SearchOrdersTool {
    pub fn new(store: Arc<dyn OrderStore>, org: OrgId) -> Self {
        Self { store, org }
    }
}

#[async_trait::async_trait]
impl Tool for SearchOrdersTool {
    fn name(&self) -> &str {
        "search_orders"
    }

    fn description(&self) -> &str {
        "Search orders by id or customer email, optionally filtered by status."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Substring to match against order id or customer email"
                },
                "status": {
                    "type": "string",
                    "enum": ["pending", "paid", "shipped", "delivered", "cancelled"],
                    "description": "Only return orders with this status"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of orders to return (default 10, max 50)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let query = args.get("query").and_then(|v| v.as_str());
        let status = match args.get("status").and_then(|v| v.as_str()) {
            Some(raw) => match OrderStatus::parse(raw) {
                Some(s) => Some(s),
                None => return ToolResult::error(format!("Unknown order status: {raw}")),
            },
            None => None,
        };
        let limit = args
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|l| (l as usize).min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);

        match self.store.search_orders(&self.org, query, status, limit).await {
            Ok(orders) => ToolResult::Json(json!({"count": orders.len(), "orders": orders})),
            Err(e) => ToolResult::error(format!("Order search failed: {e}")),
        }
    }
}

pub struct UpdateOrderStatusTool {
    store: Arc<dyn OrderStore>,
    org: OrgId,
}

impl UpdateOrderStatusTool {
    pub fn new(store: Arc<dyn OrderStore>, org: OrgId) -> Self {
        Self { store, org }
    }
}

#[async_trait::async_trait]
impl Tool for UpdateOrderStatusTool {
    fn name(&self) -> &str {
        "update_order_status"
    }

    fn description(&self) -> &str {
        "Set the status of an order the organization owns."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "orderId": {
                    "type": "integer",
                    "description": "Order id to update"
                },
                "newStatus": {
                    "type": "string",
                    "enum": ["pending", "paid", "shipped", "delivered", "cancelled"],
                    "description": "Status to set"
                }
            },
            "required": ["orderId", "newStatus"]
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let order_id = match args.get("orderId").and_then(order_id_arg) {
            Some(id) => id,
            None => return ToolResult::error("Missing required parameter: orderId"),
        };
        let new_status = match args
            .get("newStatus")
            .and_then(|v| v.as_str())
            .and_then(OrderStatus::parse)
        {
            Some(s) => s,
            None => return ToolResult::error("Missing or invalid parameter: newStatus"),
        };

        match self.store.update_order_status(&self.org, order_id, new_status).await {
            Ok(order) => {
                info!(order = order_id, status = new_status.as_str(), "order status updated");
                ToolResult::Json(json!({
                    "orderId": order_id.to_string(),
                    "status": order.status,
                }))
            }
            // Foreign and missing orders produce the same message.
            Err(Error::OrderNotFound(id)) => ToolResult::error(format!("Order #{id} not found")),
            Err(e) => ToolResult::error(format!("Order update failed: {e}")),
        }
    }
}

// Models pass ids as numbers or decimal strings; accept both.
fn order_id_arg(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

pub struct OrderStatsTool {
    store: Arc<dyn OrderStore>,
    org: OrgId,
}

impl OrderStatsTool {
    pub fn new(store: Arc<dyn OrderStore>, org: OrgId) -> Self {
        Self { store, org }
    }
}

#[async_trait::async_trait]
impl Tool for OrderStatsTool {
    fn name(&self) -> &str {
        "get_order_stats"
    }

    fn description(&self) -> &str {
        "Aggregate order counts by status and non-cancelled revenue."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        match self.store.order_stats(&self.org).await {
            Ok(stats) => ToolResult::Json(serde_json::to_value(stats).unwrap_or_default()),
            Err(e) => ToolResult::error(format!("Order stats failed: {e}")),
        }
    }
}
