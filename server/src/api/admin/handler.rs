//! Admin API Handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::core::ServerState;
use crate::db::models::{Order, OrderStatus, Product, ProductCreate};
use crate::db::repository;
use crate::db::repository::order::OrderWithCount;
use crate::orders::OrderDetail;
use crate::utils::{ok, ok_with_message, AppError, AppResponse, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

pub async fn list_orders(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<OrderWithCount>>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            OrderStatus::from_str(s)
                .map_err(|_| AppError::Validation(format!("Unknown order status: {s}")))
        })
        .transpose()?;

    let limit = query.limit.clamp(1, 200);
    let offset = query.offset.max(0);
    let orders = state.orders.admin_list(status, limit, offset).await?;
    Ok(ok(orders))
}

pub async fn order_detail(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    let detail = state.orders.admin_detail(id).await?;
    Ok(ok(detail))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// Move an order along its lifecycle. The same transition graph as the
/// customer paths applies; cancelling restores stock.
pub async fn set_order_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<SetStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let to = OrderStatus::from_str(&payload.status)
        .map_err(|_| AppError::Validation(format!("Unknown order status: {}", payload.status)))?;
    let order = state.orders.set_status(id, to).await?;
    Ok(ok_with_message(order, "Status updated"))
}

pub async fn create_product(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = repository::product::create(state.pool(), payload).await?;
    Ok(ok_with_message(product, "Product created"))
}
