//! Tests for flowgrid-tools: ToolResult, ToolRegistry, and the builtin tools
//! against the in-memory store

use chrono::Utc;
use flowgrid_core::OrgId;
use flowgrid_store::{
    CredentialVault, MemoryStore, Order, OrderStatus, Product, ProductPrice, ProductStock,
    Warehouse,
};
use flowgrid_tools::*;
use serde_json::json;
use std::sync::Arc;

const KEY: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new(CredentialVault::from_hex_key(KEY).unwrap()));
    store.insert_product(
        Product {
            id: 1,
            org_id: OrgId::new("org-1"),
            name: "Widget".into(),
            sku: "W-1".into(),
            description: None,
        },
        Some(ProductPrice { product_id: 1, amount_cents: 500, currency: "USD".into() }),
    );
    store.insert_stock(ProductStock { product_id: 1, warehouse_id: 1, quantity: 3 });
    store.insert_warehouse(Warehouse {
        id: 1,
        org_id: OrgId::new("org-1"),
        name: "Main".into(),
        location: Some("Rotterdam".into()),
    });
    store.insert_order(Order {
        id: 42,
        org_id: OrgId::new("org-2"),
        customer_email: Some("elsewhere@example.com".into()),
        status: OrderStatus::Pending,
        total_cents: 100,
        created_at: Utc::now(),
    });
    store.insert_order(Order {
        id: 7,
        org_id: OrgId::new("org-1"),
        customer_email: Some("mine@example.com".into()),
        status: OrderStatus::Paid,
        total_cents: 2500,
        created_at: Utc::now(),
    });
    store
}

// ===========================================================================
// ToolResult & registry
// ===========================================================================

#[test]
fn tool_result_error_prefix() {
    let r = ToolResult::error("Order #42 not found");
    assert!(r.is_error());
    assert_eq!(r.to_content_string(), "Error: Order #42 not found");
}

#[tokio::test]
async fn registry_execute_missing_tool() {
    let reg = ToolRegistry::new();
    let result = reg.execute("nonexistent", json!({})).await;
    assert!(result.is_error());
    assert!(result.to_content_string().contains("not found"));
}

#[tokio::test]
async fn registry_definitions_are_stable_and_complete() {
    let store = seeded_store();
    let org = OrgId::new("org-1");
    let mut reg = ToolRegistry::new();
    reg.register(CalculatorTool);
    reg.register(SearchProductsTool::new(store.clone(), org.clone()));
    reg.register(ListWarehousesTool::new(store.clone(), org.clone()));
    reg.register(SearchOrdersTool::new(store.clone(), org.clone()));
    reg.register(UpdateOrderStatusTool::new(store.clone(), org.clone()));
    reg.register(OrderStatsTool::new(store, org));

    let defs = reg.definitions();
    assert_eq!(defs.len(), 6);
    for def in &defs {
        assert!(!def.name.is_empty());
        assert!(!def.description.is_empty());
        assert!(def.input_schema.is_object());
    }
    // BTreeMap ordering keeps the definition order deterministic.
    let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

// ===========================================================================
// Calculator
// ===========================================================================

#[tokio::test]
async fn calculator_evaluates_allowed_expressions() {
    let result = CalculatorTool
        .execute(json!({"expression": "sqrt(144) + 3"}))
        .await;
    assert!(!result.is_error());
    assert_eq!(result.to_content_string(), "15");
}

#[tokio::test]
async fn calculator_rejects_code_injection() {
    let result = CalculatorTool
        .execute(json!({"expression": "require('fs')"}))
        .await;
    assert!(result.is_error());
    let msg = result.to_content_string();
    assert!(msg.starts_with("Error:"), "{msg}");
}

#[tokio::test]
async fn calculator_requires_expression() {
    let result = CalculatorTool.execute(json!({})).await;
    assert!(result.is_error());
}

// ===========================================================================
// Inventory
// ===========================================================================

#[tokio::test]
async fn search_products_returns_price_and_stock() {
    let tool = SearchProductsTool::new(seeded_store(), OrgId::new("org-1"));
    let result = tool.execute(json!({"query": "widget"})).await;
    assert!(!result.is_error());
    let body: serde_json::Value =
        serde_json::from_str(&result.to_content_string()).unwrap();
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["products"][0]["totalStock"], json!(3));
    assert_eq!(body["products"][0]["id"], json!("1"));
}

#[tokio::test]
async fn list_warehouses_is_org_scoped() {
    let store = seeded_store();
    let mine = ListWarehousesTool::new(store.clone(), OrgId::new("org-1"))
        .execute(json!({}))
        .await;
    let body: serde_json::Value = serde_json::from_str(&mine.to_content_string()).unwrap();
    assert_eq!(body["count"], json!(1));

    let foreign = ListWarehousesTool::new(store, OrgId::new("org-9"))
        .execute(json!({}))
        .await;
    let body: serde_json::Value = serde_json::from_str(&foreign.to_content_string()).unwrap();
    assert_eq!(body["count"], json!(0));
}

// ===========================================================================
// Orders
// ===========================================================================

#[tokio::test]
async fn cross_tenant_update_reads_as_not_found() {
    let store = seeded_store();
    let tool = UpdateOrderStatusTool::new(store.clone(), OrgId::new("org-1"));
    let result = tool
        .execute(json!({"orderId": 42, "newStatus": "shipped"}))
        .await;
    assert!(result.is_error());
    assert!(result.to_content_string().starts_with("Error: Order #42 not found"));
    assert_eq!(store.order(42).unwrap().status, OrderStatus::Pending);
}

#[tokio::test]
async fn own_order_update_succeeds_with_string_id() {
    let store = seeded_store();
    let tool = UpdateOrderStatusTool::new(store.clone(), OrgId::new("org-1"));
    let result = tool
        .execute(json!({"orderId": "7", "newStatus": "shipped"}))
        .await;
    assert!(!result.is_error(), "{}", result.to_content_string());
    assert_eq!(store.order(7).unwrap().status, OrderStatus::Shipped);
}

#[tokio::test]
async fn order_search_filters_by_status() {
    let tool = SearchOrdersTool::new(seeded_store(), OrgId::new("org-1"));
    let result = tool.execute(json!({"status": "paid"})).await;
    let body: serde_json::Value = serde_json::from_str(&result.to_content_string()).unwrap();
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["orders"][0]["id"], json!("7"));

    let result = tool.execute(json!({"status": "nonsense"})).await;
    assert!(result.is_error());
}

#[tokio::test]
async fn order_stats_cover_own_org_only() {
    let tool = OrderStatsTool::new(seeded_store(), OrgId::new("org-1"));
    let result = tool.execute(json!({})).await;
    let body: serde_json::Value = serde_json::from_str(&result.to_content_string()).unwrap();
    assert_eq!(body["totalOrders"], json!(1));
    assert_eq!(body["revenueCents"], json!(2500));
}

// ===========================================================================
// Passthrough
// ===========================================================================

#[tokio::test]
async fn passthrough_echoes_input() {
    let tool = PassthroughTool::new("mystery_tool", "echoes");
    let result = tool.execute(json!({"input": "ping"})).await;
    let body: serde_json::Value = serde_json::from_str(&result.to_content_string()).unwrap();
    assert_eq!(body, json!({"input": "ping"}));
}
