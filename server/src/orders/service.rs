//! Order Service
//!
//! Order creation and cancellation run inside a single database transaction
//! whose first statement is a write. Under SQLite's WAL journal that takes
//! the write lock up front, so two checkouts racing for the last unit never
//! deadlock upgrading a read lock; one of them simply waits.

use super::error::{OrderError, OrderResult};
use crate::db::models::{CartLine, Order, OrderItem, OrderStatus};
use crate::db::repository::{self, RepoError};
use crate::db::repository::order::{OrderInsert, OrderWithCount};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use validator::Validate;

/// Subtotal at or above this ships free
pub const FREE_SHIPPING_THRESHOLD: i64 = 50_000;
/// Flat fee below the threshold, in KRW
pub const FLAT_SHIPPING_FEE: i64 = 3_000;

const ORDER_NUMBER_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Checkout request: shipping details for the order built from the cart
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 50))]
    pub recipient_name: String,
    #[validate(length(min = 1, max = 20))]
    pub recipient_phone: String,
    #[validate(length(min = 1, max = 200))]
    pub recipient_address: String,
    pub recipient_address_detail: Option<String>,
    pub recipient_zipcode: Option<String>,
    pub memo: Option<String>,
    pub payment_method: Option<String>,
}

/// What the checkout handler returns to the client
#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrder {
    pub order_id: i64,
    pub order_number: String,
    pub total_amount: i64,
    pub shipping_fee: i64,
}

/// Order detail: header plus frozen line snapshots
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
}

impl OrderService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Convert the user's cart into a pending order.
    ///
    /// Stock is reserved line by line with atomic check-and-decrement
    /// updates; the first failed guard rolls the whole transaction back, so
    /// an order either reserves every line or reserves nothing.
    pub async fn create_order(
        &self,
        user_id: i64,
        req: &CreateOrderRequest,
    ) -> OrderResult<CreatedOrder> {
        if req.recipient_name.trim().is_empty()
            || req.recipient_phone.trim().is_empty()
            || req.recipient_address.trim().is_empty()
        {
            return Err(OrderError::MissingRecipient);
        }

        let lines = repository::cart::lines_for_user(&self.pool, user_id).await?;
        if lines.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        // Pre-check outside the transaction for a friendly error message.
        // The authoritative check is the guarded decrement below.
        for line in &lines {
            if line.stock < line.quantity {
                return Err(OrderError::InsufficientStock {
                    product: line.name.clone(),
                    remaining: line.stock,
                });
            }
        }

        let subtotal: i64 = lines.iter().map(CartLine::line_total).sum();
        let shipping_fee = shipping_fee_for(subtotal);
        let total_amount = subtotal + shipping_fee;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        for line in &lines {
            let reserved =
                repository::product::reserve_stock(&mut *tx, line.product_id, line.quantity)
                    .await?;
            if !reserved {
                tx.rollback().await.map_err(RepoError::from)?;
                let remaining = repository::product::stock(&self.pool, line.product_id)
                    .await?
                    .unwrap_or(0);
                return Err(OrderError::InsufficientStock {
                    product: line.name.clone(),
                    remaining,
                });
            }
        }

        let insert = OrderInsert {
            user_id,
            order_number: generate_order_number(),
            total_amount,
            shipping_fee,
            recipient_name: req.recipient_name.trim().to_string(),
            recipient_phone: req.recipient_phone.trim().to_string(),
            recipient_address: req.recipient_address.trim().to_string(),
            recipient_address_detail: req.recipient_address_detail.clone(),
            recipient_zipcode: req.recipient_zipcode.clone(),
            memo: req.memo.clone(),
            payment_method: req.payment_method.clone(),
        };

        // Retry once with a fresh number on the unlikely unique collision
        let (order_id, order_number) = match repository::order::insert(&mut *tx, &insert).await {
            Ok(id) => (id, insert.order_number.clone()),
            Err(RepoError::Duplicate(_)) => {
                let retry = OrderInsert {
                    order_number: generate_order_number(),
                    ..insert
                };
                match repository::order::insert(&mut *tx, &retry).await {
                    Ok(id) => (id, retry.order_number.clone()),
                    Err(RepoError::Duplicate(_)) => {
                        tx.rollback().await.map_err(RepoError::from)?;
                        return Err(OrderError::OrderNumberCollision);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        for line in &lines {
            repository::order::insert_item(
                &mut *tx,
                order_id,
                line.product_id,
                &line.name,
                line.effective_price(),
                line.quantity,
            )
            .await?;
        }

        repository::cart::clear_for_user(&mut *tx, user_id).await?;

        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            order_id,
            order_number = %order_number,
            user_id,
            total_amount,
            "Order created"
        );

        Ok(CreatedOrder {
            order_id,
            order_number,
            total_amount,
            shipping_fee,
        })
    }

    /// Cancel a pending or paid order and restore its stock.
    ///
    /// The status swap is the first statement of the transaction; if a
    /// concurrent call already moved the order, the swap affects zero rows
    /// and no stock is released twice.
    pub async fn cancel_order(&self, order_id: i64, user_id: i64) -> OrderResult<Order> {
        let order = repository::order::find_by_id_and_user(&self.pool, order_id, user_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        self.cancel_with_restock(order).await
    }

    /// Cancellation after an external refund; caller has already verified
    /// ownership and gateway state.
    pub async fn cancel_paid_order(&self, order_id: i64) -> OrderResult<Order> {
        let order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;
        if order.status != OrderStatus::Paid {
            return Err(OrderError::NotCancellable(order.status));
        }
        self.cancel_with_restock(order).await
    }

    async fn cancel_with_restock(&self, order: Order) -> OrderResult<Order> {
        if !matches!(order.status, OrderStatus::Pending | OrderStatus::Paid) {
            return Err(OrderError::NotCancellable(order.status));
        }

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        let swapped = repository::order::update_status_cas(
            &mut *tx,
            order.id,
            order.status,
            OrderStatus::Cancelled,
        )
        .await?;
        if !swapped {
            tx.rollback().await.map_err(RepoError::from)?;
            let current = repository::order::find_by_id(&self.pool, order.id)
                .await?
                .ok_or(OrderError::NotFound)?;
            return Err(OrderError::AlreadyProcessed(current.status));
        }

        let items = repository::order::items_for_order(&mut *tx, order.id).await?;
        for item in &items {
            repository::product::release_stock(&mut *tx, item.product_id, item.quantity).await?;
        }

        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            order_id = order.id,
            order_number = %order.order_number,
            from = %order.status,
            "Order cancelled, stock restored"
        );

        repository::order::find_by_id(&self.pool, order.id)
            .await?
            .ok_or(OrderError::NotFound)
    }

    /// Record a successful payment: pending → paid with the gateway reference
    pub async fn mark_paid(
        &self,
        order_id: i64,
        payment_key: &str,
        payment_method: Option<&str>,
    ) -> OrderResult<Order> {
        let swapped = repository::order::mark_paid_cas(
            &self.pool,
            order_id,
            payment_key,
            payment_method,
            Utc::now(),
        )
        .await?;

        let order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;
        if !swapped {
            return Err(OrderError::AlreadyProcessed(order.status));
        }
        Ok(order)
    }

    /// Administrative status change; enforces the same transition graph as
    /// the customer-facing paths, releasing stock on cancellation.
    pub async fn set_status(&self, order_id: i64, to: OrderStatus) -> OrderResult<Order> {
        let order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !order.status.can_transition(to) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to,
            });
        }

        if to == OrderStatus::Cancelled {
            return self.cancel_with_restock(order).await;
        }

        let swapped =
            repository::order::update_status_cas(&self.pool, order_id, order.status, to).await?;
        if !swapped {
            let current = repository::order::find_by_id(&self.pool, order_id)
                .await?
                .ok_or(OrderError::NotFound)?;
            return Err(OrderError::AlreadyProcessed(current.status));
        }

        repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(OrderError::NotFound)
    }

    pub async fn list_for_user(&self, user_id: i64) -> OrderResult<Vec<OrderWithCount>> {
        Ok(repository::order::list_for_user(&self.pool, user_id).await?)
    }

    pub async fn detail_for_user(&self, order_id: i64, user_id: i64) -> OrderResult<OrderDetail> {
        let order = repository::order::find_by_id_and_user(&self.pool, order_id, user_id)
            .await?
            .ok_or(OrderError::NotFound)?;
        let items = repository::order::items_for_order(&self.pool, order_id).await?;
        Ok(OrderDetail { order, items })
    }

    pub async fn admin_list(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> OrderResult<Vec<OrderWithCount>> {
        Ok(repository::order::list_all(&self.pool, status, limit, offset).await?)
    }

    pub async fn admin_detail(&self, order_id: i64) -> OrderResult<OrderDetail> {
        let order = repository::order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;
        let items = repository::order::items_for_order(&self.pool, order_id).await?;
        Ok(OrderDetail { order, items })
    }
}

/// Free over the threshold, flat fee below it
pub fn shipping_fee_for(subtotal: i64) -> i64 {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        0
    } else {
        FLAT_SHIPPING_FEE
    }
}

/// "GG" + yymmdd + 6 random uppercase alphanumerics, e.g. GG260829X4K2QD
pub fn generate_order_number() -> String {
    let date = Utc::now().format("%y%m%d");
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| ORDER_NUMBER_CHARS[rng.gen_range(0..ORDER_NUMBER_CHARS.len())] as char)
        .collect();
    format!("GG{date}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipping_is_free_at_threshold() {
        assert_eq!(shipping_fee_for(FREE_SHIPPING_THRESHOLD), 0);
        assert_eq!(shipping_fee_for(FREE_SHIPPING_THRESHOLD + 1), 0);
    }

    #[test]
    fn shipping_is_flat_below_threshold() {
        assert_eq!(shipping_fee_for(0), FLAT_SHIPPING_FEE);
        assert_eq!(shipping_fee_for(FREE_SHIPPING_THRESHOLD - 1), FLAT_SHIPPING_FEE);
    }

    #[test]
    fn order_number_shape() {
        let n = generate_order_number();
        assert_eq!(n.len(), 2 + 6 + ORDER_NUMBER_SUFFIX_LEN);
        assert!(n.starts_with("GG"));
        assert!(n[2..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn order_numbers_vary() {
        let a = generate_order_number();
        let b = generate_order_number();
        // Same date prefix, random suffix; a collision here is 1 in 36^6
        assert_ne!(a, b);
    }
}
