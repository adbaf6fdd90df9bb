//! Cart Models

use serde::{Deserialize, Serialize};

/// Cart line joined with its product: the snapshot input for order
/// creation (current price, sale price and stock at read time).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub name: String,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub stock: i64,
}

impl CartLine {
    /// Effective unit price: sale price if present, else list price
    pub fn effective_price(&self) -> i64 {
        self.sale_price.unwrap_or(self.price)
    }

    /// Line total at the effective price
    pub fn line_total(&self) -> i64 {
        self.effective_price() * self.quantity
    }
}
