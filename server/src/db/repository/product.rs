//! Product Repository: catalog reads and the stock ledger
//!
//! Stock is only ever mutated through [`reserve_stock`] / [`release_stock`]:
//! arithmetic deltas applied in the storage layer, so concurrent reservations
//! against the same product serialize at the database and never interleave
//! into a lost update.

use super::{RepoError, RepoResult};
use crate::db::models::{Product, ProductCreate};
use sqlx::SqlitePool;

pub async fn find_all_active(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, price, sale_price, stock, is_active, created_at
         FROM products WHERE is_active = 1 ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(products)
}

pub async fn find_by_id_active(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, price, sale_price, stock, is_active, created_at
         FROM products WHERE id = ? AND is_active = 1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    if data.price < 0 || data.stock < 0 {
        return Err(RepoError::Validation(
            "price and stock must be non-negative".into(),
        ));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO products (name, price, sale_price, stock) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(data.price)
    .bind(data.sale_price)
    .bind(data.stock)
    .fetch_one(pool)
    .await?;

    find_by_id_active(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Current stock for a product, regardless of active flag
pub async fn stock<'e, E>(executor: E, product_id: i64) -> RepoResult<Option<i64>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(executor)
        .await?;
    Ok(stock)
}

/// Reserve `qty` units: atomic check-and-decrement.
///
/// Returns `false` when the guard `stock >= qty` did not hold (insufficient
/// stock or unknown product); the caller's transaction must roll back.
pub async fn reserve_stock<'e, E>(executor: E, product_id: i64, qty: i64) -> RepoResult<bool>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
    )
    .bind(qty)
    .bind(product_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Release `qty` units back to stock. Invoked exactly once per cancelled
/// line, inside the cancellation transaction.
pub async fn release_stock<'e, E>(executor: E, product_id: i64, qty: i64) -> RepoResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE products SET stock = stock + ?1 WHERE id = ?2")
        .bind(qty)
        .bind(product_id)
        .execute(executor)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {product_id} not found")));
    }
    Ok(())
}
