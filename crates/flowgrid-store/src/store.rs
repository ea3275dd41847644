//! Store traits: the seams between the engine and the relational store.
//!
//! Every operation is scoped to an organization; a cross-org lookup behaves
//! exactly like a missing row. Implementations issue short per-query calls
//! and never hold locks across await points.

use crate::entities::{Order, OrderStats, OrderStatus, ProductHit, Warehouse};
use flowgrid_core::{OrgId, Result, Workflow, WorkflowId};

#[async_trait::async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn workflow(&self, org: &OrgId, id: &WorkflowId) -> Result<Workflow>;
}

#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the decrypted secret for a credential the organization owns.
    /// Missing, foreign, and undecryptable credentials are indistinguishable
    /// to the caller.
    async fn decrypt_credential(&self, org: &OrgId, credential_id: &str) -> Result<String>;
}

#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    async fn search_products(
        &self,
        org: &OrgId,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ProductHit>>;

    async fn list_warehouses(&self, org: &OrgId) -> Result<Vec<Warehouse>>;
}

#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn search_orders(
        &self,
        org: &OrgId,
        query: Option<&str>,
        status: Option<OrderStatus>,
        limit: usize,
    ) -> Result<Vec<Order>>;

    /// Fails when the order does not exist *or* belongs to another tenant;
    /// the two cases are not distinguished.
    async fn update_order_status(
        &self,
        org: &OrgId,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<Order>;

    async fn order_stats(&self, org: &OrgId) -> Result<OrderStats>;
}
