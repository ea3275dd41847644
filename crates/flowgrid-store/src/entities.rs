//! Persisted entity types for credentials and the built-in inventory/order
//! domain.
//!
//! Row identifiers are BigInt in the relational schema; they serialise as
//! decimal strings at the UI boundary (`decimal_string` below). Organization
//! identifiers stay opaque strings throughout.

use chrono::{DateTime, Utc};
use flowgrid_core::OrgId;
use serde::{Deserialize, Serialize};

/// Serialize i64 row ids as decimal strings, accepting either form on input.
pub mod decimal_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(i64),
            Str(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Credential kind - closed set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialKind {
    Openai,
    Anthropic,
    Gemini,
}

/// An encrypted secret owned by an organization. The plaintext never leaves
/// the store layer except through `CredentialStore::decrypt_credential`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credential {
    pub id: String,
    pub org_id: OrgId,
    pub kind: CredentialKind,
    pub name: String,
    #[serde(skip_serializing)]
    pub encrypted_value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(with = "decimal_string")]
    pub id: i64,
    pub org_id: OrgId,
    pub name: String,
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPrice {
    #[serde(with = "decimal_string")]
    pub product_id: i64,
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStock {
    #[serde(with = "decimal_string")]
    pub product_id: i64,
    #[serde(with = "decimal_string")]
    pub warehouse_id: i64,
    pub quantity: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    #[serde(with = "decimal_string")]
    pub id: i64,
    pub org_id: OrgId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(with = "decimal_string")]
    pub id: i64,
    pub org_id: OrgId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(with = "decimal_string")]
    pub order_id: i64,
    #[serde(with = "decimal_string")]
    pub product_id: i64,
    pub quantity: i64,
    pub unit_cents: i64,
}

/// A product joined with its price and total stock, as returned to tools.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    #[serde(flatten)]
    pub product: Product,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<ProductPrice>,
    pub total_stock: i64,
}

/// Aggregate counts returned by `get_order_stats`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    pub pending: usize,
    pub paid: usize,
    pub shipped: usize,
    pub delivered: usize,
    pub cancelled: usize,
    pub revenue_cents: i64,
}
