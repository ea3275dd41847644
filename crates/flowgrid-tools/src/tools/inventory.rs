//! Inventory tools — read-only product and warehouse lookups, scoped to the
//! agent's owning organization

use crate::registry::{Tool, ToolResult};
use flowgrid_core::OrgId;
use flowgrid_store::InventoryStore;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;

pub struct SearchProductsTool {
    store: Arc<dyn InventoryStore>,
    org: OrgId,
}

impl SearchProductsTool {
    pub fn new(store: Arc<dyn InventoryStore>, org: OrgId) -> Self {
        Self { store, org }
    }
}

#[async_trait::async_trait]
impl Tool for SearchProductsTool {
    fn name(&self) -> &str {
        "search_products"
    }

    fn description(&self) -> &str {
        "Search the product catalogue by name or SKU. Returns products with price and total stock."
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
                    "description": "Substring to match against product name or SKU; empty returns everything"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of products to return (default 10, max 50)"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let query = args.get("query").and_then(|v| v.as_str());
        let limit = args
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|l| (l as usize).min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT);

        match self.store.search_products(&self.org, query, limit).await {
            Ok(hits) => ToolResult::Json(json!({"count": hits.len(), "products": hits})),
            Err(e) => ToolResult::error(format!("Product search failed: {e}")),
        }
    }
}

pub struct ListWarehousesTool {
    store: Arc<dyn InventoryStore>,
    org: OrgId,
}

impl ListWarehousesTool {
    pub fn new(store: Arc<dyn InventoryStore>, org: OrgId) -> Self {
        Self { store, org }
    }
}

#[async_trait::async_trait]
impl Tool for ListWarehousesTool {
    fn name(&self) -> &str {
        "list_warehouses"
    }

    fn description(&self) -> &str {
        "List the organization's warehouses."
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        match self.store.list_warehouses(&self.org).await {
            Ok(warehouses) => {
                ToolResult::Json(json!({"count": warehouses.len(), "warehouses": warehouses}))
            }
            Err(e) => ToolResult::error(format!("Warehouse lookup failed: {e}")),
        }
    }
}
