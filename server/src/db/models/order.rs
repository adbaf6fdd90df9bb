//! Order Models
//!
//! Orders carry frozen line snapshots so catalog edits never rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Order status
// =============================================================================

/// Order lifecycle status
///
/// Permitted edges:
///
/// ```text
/// pending ──► paid ──► preparing ──► shipped ──► delivered
///    │          │
///    └──────────┴─► cancelled
/// ```
///
/// `delivered` and `cancelled` are terminal. Everything that gates a payment
/// side effect does so through a conditional update on this column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Preparing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether a transition to `target` is a permitted edge
    pub fn can_transition(self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Paid)
                | (Pending, Cancelled)
                | (Paid, Preparing)
                | (Paid, Cancelled)
                | (Preparing, Shipped)
                | (Shipped, Delivered)
        )
    }

    /// Terminal states have no outgoing edges
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "preparing" => Ok(OrderStatus::Preparing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {other}")),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// Human-facing identifier: GG + yymmdd + 6 random base36 chars
    pub order_number: String,
    /// Items subtotal + shipping fee, fixed at creation
    pub total_amount: i64,
    pub shipping_fee: i64,
    pub status: OrderStatus,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_address_detail: Option<String>,
    pub recipient_zipcode: Option<String>,
    pub memo: Option<String>,
    pub payment_method: Option<String>,
    /// External gateway reference, set when the order is marked paid
    pub payment_key: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order line snapshot: name and unit price frozen at purchase time
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_price: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permitted_edges_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition(Paid));
        assert!(Pending.can_transition(Cancelled));
        assert!(Paid.can_transition(Preparing));
        assert!(Paid.can_transition(Cancelled));
        assert!(Preparing.can_transition(Shipped));
        assert!(Shipped.can_transition(Delivered));

        // No resurrecting terminal orders
        assert!(!Cancelled.can_transition(Pending));
        assert!(!Cancelled.can_transition(Paid));
        assert!(!Delivered.can_transition(Shipped));
        // No skipping ahead
        assert!(!Pending.can_transition(Shipped));
        assert!(!Preparing.can_transition(Cancelled));
        assert!(!Shipped.can_transition(Cancelled));
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Paid.is_terminal());
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Preparing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(s.as_str().parse::<OrderStatus>().unwrap(), s);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }
}
