//! In-memory store: the test double and single-process default.

use crate::entities::{
    Credential, CredentialKind, Order, OrderStats, OrderStatus, Product, ProductHit, ProductPrice,
    ProductStock, Warehouse,
};
use crate::store::{CredentialStore, InventoryStore, OrderStore, WorkflowStore};
use crate::vault::CredentialVault;
use dashmap::DashMap;
use flowgrid_core::{Error, OrgId, Result, Workflow, WorkflowId};
use tracing::warn;

pub struct MemoryStore {
    vault: CredentialVault,
    workflows: DashMap<WorkflowId, Workflow>,
    credentials: DashMap<String, Credential>,
    products: DashMap<i64, Product>,
    prices: DashMap<i64, ProductPrice>,
    stocks: DashMap<(i64, i64), ProductStock>,
    warehouses: DashMap<i64, Warehouse>,
    orders: DashMap<i64, Order>,
}

impl MemoryStore {
    pub fn new(vault: CredentialVault) -> Self {
        Self {
            vault,
            workflows: DashMap::new(),
            credentials: DashMap::new(),
            products: DashMap::new(),
            prices: DashMap::new(),
            stocks: DashMap::new(),
            warehouses: DashMap::new(),
            orders: DashMap::new(),
        }
    }

    pub fn insert_workflow(&self, workflow: Workflow) {
        self.workflows.insert(workflow.id.clone(), workflow);
    }

    /// Encrypts `plaintext` through the vault and stores the credential.
    pub fn insert_credential(
        &self,
        id: impl Into<String>,
        org: OrgId,
        kind: CredentialKind,
        name: impl Into<String>,
        plaintext: &str,
    ) -> Result<()> {
        let id = id.into();
        let encrypted_value = self
            .vault
            .encrypt(plaintext)
            .map_err(|e| Error::Store(e.to_string()))?;
        self.credentials.insert(
            id.clone(),
            Credential {
                id,
                org_id: org,
                kind,
                name: name.into(),
                encrypted_value,
            },
        );
        Ok(())
    }

    pub fn insert_product(&self, product: Product, price: Option<ProductPrice>) {
        if let Some(price) = price {
            self.prices.insert(product.id, price);
        }
        self.products.insert(product.id, product);
    }

    pub fn insert_stock(&self, stock: ProductStock) {
        self.stocks.insert((stock.product_id, stock.warehouse_id), stock);
    }

    pub fn insert_warehouse(&self, warehouse: Warehouse) {
        self.warehouses.insert(warehouse.id, warehouse);
    }

    pub fn insert_order(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn order(&self, id: i64) -> Option<Order> {
        self.orders.get(&id).map(|o| o.clone())
    }
}

#[async_trait::async_trait]
impl WorkflowStore for MemoryStore {
    async fn workflow(&self, org: &OrgId, id: &WorkflowId) -> Result<Workflow> {
        self.workflows
            .get(id)
            .filter(|w| &w.org_id == org)
            .map(|w| w.clone())
            .ok_or_else(|| Error::WorkflowNotFound(id.clone()))
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn decrypt_credential(&self, org: &OrgId, credential_id: &str) -> Result<String> {
        let credential = self
            .credentials
            .get(credential_id)
            .filter(|c| &c.org_id == org)
            .ok_or(Error::CredentialNotFound)?;
        self.vault.decrypt(&credential.encrypted_value).map_err(|e| {
            // Surfaced as absent; the cause stays server-side.
            warn!(credential = credential_id, "credential decryption failed: {e}");
            Error::CredentialNotFound
        })
    }
}

#[async_trait::async_trait]
impl InventoryStore for MemoryStore {
    async fn search_products(
        &self,
        org: &OrgId,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ProductHit>> {
        let needle = query.unwrap_or("").to_lowercase();
        let mut hits: Vec<ProductHit> = self
            .products
            .iter()
            .filter(|p| &p.org_id == org)
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.sku.to_lowercase().contains(&needle)
            })
            .map(|p| {
                let total_stock = self
                    .stocks
                    .iter()
                    .filter(|s| s.product_id == p.id)
                    .map(|s| s.quantity)
                    .sum();
                ProductHit {
                    product: p.clone(),
                    price: self.prices.get(&p.id).map(|pr| pr.clone()),
                    total_stock,
                }
            })
            .collect();
        hits.sort_by_key(|h| h.product.id);
        hits.truncate(limit);
        Ok(hits)
    }

    async fn list_warehouses(&self, org: &OrgId) -> Result<Vec<Warehouse>> {
        let mut out: Vec<Warehouse> = self
            .warehouses
            .iter()
            .filter(|w| &w.org_id == org)
            .map(|w| w.clone())
            .collect();
        out.sort_by_key(|w| w.id);
        Ok(out)
    }
}

#[async_trait::async_trait]
impl OrderStore for MemoryStore {
    async fn search_orders(
        &self,
        org: &OrgId,
        query: Option<&str>,
        status: Option<OrderStatus>,
        limit: usize,
    ) -> Result<Vec<Order>> {
        let needle = query.unwrap_or("").to_lowercase();
        let mut out: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| &o.org_id == org)
            .filter(|o| status.map_or(true, |s| o.status == s))
            .filter(|o| {
                needle.is_empty()
                    || o.id.to_string().contains(&needle)
                    || o.customer_email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&needle))
            })
            .map(|o| o.clone())
            .collect();
        out.sort_by_key(|o| o.id);
        out.truncate(limit);
        Ok(out)
    }

    async fn update_order_status(
        &self,
        org: &OrgId,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<Order> {
        let mut order = self
            .orders
            .get_mut(&order_id)
            .filter(|o| &o.org_id == org)
            .ok_or(Error::OrderNotFound(order_id))?;
        order.status = status;
        Ok(order.clone())
    }

    async fn order_stats(&self, org: &OrgId) -> Result<OrderStats> {
        let mut stats = OrderStats::default();
        for order in self.orders.iter().filter(|o| &o.org_id == org) {
            stats.total_orders += 1;
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Paid => stats.paid += 1,
                OrderStatus::Shipped => stats.shipped += 1,
                OrderStatus::Delivered => stats.delivered += 1,
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
            if order.status != OrderStatus::Cancelled {
                stats.revenue_cents += order.total_cents;
            }
        }
        Ok(stats)
    }
}
