//! Order Repository
//!
//! Status transitions are conditional updates: the `WHERE status IN (...)`
//! clause is the compare-and-swap that makes retried payment calls observe
//! "already processed" instead of re-executing side effects.

use super::RepoResult;
use crate::db::models::{Order, OrderItem, OrderStatus};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

const ORDER_COLUMNS: &str = "id, user_id, order_number, total_amount, shipping_fee, status, \
     recipient_name, recipient_phone, recipient_address, recipient_address_detail, \
     recipient_zipcode, memo, payment_method, payment_key, paid_at, created_at, updated_at";

/// Insert payload for a new order (always created as `pending`)
#[derive(Debug, Clone)]
pub struct OrderInsert {
    pub user_id: i64,
    pub order_number: String,
    pub total_amount: i64,
    pub shipping_fee: i64,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub recipient_address_detail: Option<String>,
    pub recipient_zipcode: Option<String>,
    pub memo: Option<String>,
    pub payment_method: Option<String>,
}

/// Order summary row for list views
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct OrderWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub item_count: i64,
}

/// Insert an order row; returns the surrogate id
pub async fn insert<'e, E>(executor: E, data: &OrderInsert) -> RepoResult<i64>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (user_id, order_number, total_amount, shipping_fee, status,
             recipient_name, recipient_phone, recipient_address, recipient_address_detail,
             recipient_zipcode, memo, payment_method, created_at, updated_at)
         VALUES (?, ?, ?, ?, 'pending', ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(data.user_id)
    .bind(&data.order_number)
    .bind(data.total_amount)
    .bind(data.shipping_fee)
    .bind(&data.recipient_name)
    .bind(&data.recipient_phone)
    .bind(&data.recipient_address)
    .bind(&data.recipient_address_detail)
    .bind(&data.recipient_zipcode)
    .bind(&data.memo)
    .bind(&data.payment_method)
    .bind(Utc::now())
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;
    Ok(id)
}

/// Insert a frozen line snapshot for an order
pub async fn insert_item<'e, E>(
    executor: E,
    order_id: i64,
    product_id: i64,
    product_name: &str,
    product_price: i64,
    quantity: i64,
) -> RepoResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, product_name, product_price, quantity)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(product_name)
    .bind(product_price)
    .bind(quantity)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(order)
}

/// Owner-scoped lookup; another principal's order is indistinguishable from
/// a missing one
pub async fn find_by_id_and_user(
    pool: &SqlitePool,
    id: i64,
    user_id: i64,
) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ? AND user_id = ?"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(order)
}

pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<OrderWithCount>> {
    let orders = sqlx::query_as::<_, OrderWithCount>(
        "SELECT o.*, COUNT(oi.id) AS item_count
         FROM orders o
         LEFT JOIN order_items oi ON oi.order_id = o.id
         WHERE o.user_id = ?
         GROUP BY o.id
         ORDER BY o.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// Admin list with optional status filter and pagination
pub async fn list_all(
    pool: &SqlitePool,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<Vec<OrderWithCount>> {
    let orders = match status {
        Some(status) => {
            sqlx::query_as::<_, OrderWithCount>(
                "SELECT o.*, COUNT(oi.id) AS item_count
                 FROM orders o
                 LEFT JOIN order_items oi ON oi.order_id = o.id
                 WHERE o.status = ?
                 GROUP BY o.id
                 ORDER BY o.created_at DESC
                 LIMIT ? OFFSET ?",
            )
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, OrderWithCount>(
                "SELECT o.*, COUNT(oi.id) AS item_count
                 FROM orders o
                 LEFT JOIN order_items oi ON oi.order_id = o.id
                 GROUP BY o.id
                 ORDER BY o.created_at DESC
                 LIMIT ? OFFSET ?",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(orders)
}

/// Line snapshots for an order
pub async fn items_for_order<'e, E>(executor: E, order_id: i64) -> RepoResult<Vec<OrderItem>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, product_name, product_price, quantity, created_at
         FROM order_items WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;
    Ok(items)
}

/// Compare-and-swap the status: succeeds only when the current status is
/// `from`. Returns `false` when the precondition did not hold.
pub async fn update_status_cas<'e, E>(
    executor: E,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> RepoResult<bool>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(to)
    .bind(Utc::now())
    .bind(order_id)
    .bind(from)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// CAS pending → paid, recording the gateway reference and paid time.
/// A second identical call observes a non-pending status and returns `false`.
pub async fn mark_paid_cas<'e, E>(
    executor: E,
    order_id: i64,
    payment_key: &str,
    payment_method: Option<&str>,
    paid_at: DateTime<Utc>,
) -> RepoResult<bool>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE orders
         SET status = 'paid',
             payment_key = ?,
             payment_method = COALESCE(?, payment_method),
             paid_at = ?,
             updated_at = ?
         WHERE id = ? AND status = 'pending'",
    )
    .bind(payment_key)
    .bind(payment_method)
    .bind(paid_at)
    .bind(Utc::now())
    .bind(order_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}
