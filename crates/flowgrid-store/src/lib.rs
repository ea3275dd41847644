//! Flowgrid store: entity types, org-scoped store traits, the in-memory
//! implementation, and the credential vault.

pub mod entities;
pub mod memory;
pub mod store;
pub mod vault;

pub use entities::{
    Credential, CredentialKind, Order, OrderItem, OrderStats, OrderStatus, Product, ProductHit,
    ProductPrice, ProductStock, Warehouse,
};
pub use memory::MemoryStore;
pub use store::{CredentialStore, InventoryStore, OrderStore, WorkflowStore};
pub use vault::{CredentialVault, VaultError};
