//! Product API Handlers

use axum::{
    extract::{Path, State},
    Json,
};

use crate::core::ServerState;
use crate::db::models::Product;
use crate::db::repository;
use crate::utils::{ok, AppError, AppResponse, AppResult};

pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    let products = repository::product::find_all_active(state.pool()).await?;
    Ok(ok(products))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = repository::product::find_by_id_active(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;
    Ok(ok(product))
}
