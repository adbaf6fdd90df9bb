//! Cart API Handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::CartLine;
use crate::db::repository;
use crate::orders::shipping_fee_for;
use crate::utils::{ok, ok_with_message, AppError, AppResponse, AppResult};

/// Cart with the totals the checkout page shows
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: i64,
    pub shipping_fee: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: i64,
    #[validate(range(min = 1, max = 999))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, max = 999))]
    pub quantity: i64,
}

pub async fn view(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<AppResponse<CartView>>> {
    let items = repository::cart::lines_for_user(state.pool(), user.id).await?;
    let subtotal: i64 = items.iter().map(CartLine::line_total).sum();
    let shipping_fee = if items.is_empty() {
        0
    } else {
        shipping_fee_for(subtotal)
    };
    Ok(ok(CartView {
        total: subtotal + shipping_fee,
        items,
        subtotal,
        shipping_fee,
    }))
}

pub async fn add_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<AppResponse<()>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Only active products can enter the cart
    repository::product::find_by_id_active(state.pool(), payload.product_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Product {} not found", payload.product_id))
        })?;

    repository::cart::add_item(state.pool(), user.id, payload.product_id, payload.quantity)
        .await?;
    Ok(ok_with_message((), "Added to cart"))
}

pub async fn update_quantity(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<AppResponse<()>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    repository::cart::update_quantity(state.pool(), id, user.id, payload.quantity).await?;
    Ok(ok_with_message((), "Quantity updated"))
}

pub async fn remove_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<()>>> {
    repository::cart::remove_item(state.pool(), id, user.id).await?;
    Ok(ok_with_message((), "Removed from cart"))
}

pub async fn clear(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<AppResponse<()>>> {
    repository::cart::clear_for_user(state.pool(), user.id).await?;
    Ok(ok_with_message((), "Cart cleared"))
}
