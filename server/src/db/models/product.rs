//! Product Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog product row
///
/// `stock` is mutated only through the ledger operations in
/// `repository::product` (atomic arithmetic deltas, never read-modify-write).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// List price in KRW
    pub price: i64,
    /// Discounted price; effective unit price when present
    pub sale_price: Option<i64>,
    pub stock: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Effective unit price: sale price if present, else list price
    pub fn effective_price(&self) -> i64 {
        self.sale_price.unwrap_or(self.price)
    }
}

/// Create payload (admin / seeding)
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub price: i64,
    pub sale_price: Option<i64>,
    #[serde(default)]
    pub stock: i64,
}
