//! Cart Repository

use super::{RepoError, RepoResult};
use crate::db::models::CartLine;
use sqlx::SqlitePool;

/// Cart lines for a user, joined with current product data
pub async fn lines_for_user<'e, E>(executor: E, user_id: i64) -> RepoResult<Vec<CartLine>>
where
    E: sqlx::SqliteExecutor<'e>,
{
    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT c.id, c.product_id, c.quantity, p.name, p.price, p.sale_price, p.stock
         FROM cart_items c
         JOIN products p ON p.id = c.product_id
         WHERE c.user_id = ? AND p.is_active = 1
         ORDER BY c.created_at",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;
    Ok(lines)
}

/// Add a product to the cart; merges quantity into an existing line
pub async fn add_item(
    pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO cart_items (user_id, product_id, quantity) VALUES (?, ?, ?)
         ON CONFLICT (user_id, product_id)
         DO UPDATE SET quantity = quantity + excluded.quantity",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .execute(pool)
    .await?;
    Ok(())
}

/// Set the quantity of a cart line; owner-scoped, unknown line is NotFound
pub async fn update_quantity(
    pool: &SqlitePool,
    cart_item_id: i64,
    user_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    let result = sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ? AND user_id = ?")
        .bind(quantity)
        .bind(cart_item_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Cart item {cart_item_id} not found"
        )));
    }
    Ok(())
}

/// Remove a cart line; owner-scoped
pub async fn remove_item(pool: &SqlitePool, cart_item_id: i64, user_id: i64) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = ? AND user_id = ?")
        .bind(cart_item_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Cart item {cart_item_id} not found"
        )));
    }
    Ok(())
}

/// Delete every cart line for a user
pub async fn clear_for_user<'e, E>(executor: E, user_id: i64) -> RepoResult<()>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}
