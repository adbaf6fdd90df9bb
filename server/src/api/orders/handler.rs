//! Order API Handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::db::repository::order::OrderWithCount;
use crate::orders::{CreateOrderRequest, CreatedOrder, OrderDetail};
use crate::utils::{ok, ok_with_message, AppError, AppResponse, AppResult};

pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<AppResponse<CreatedOrder>>> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let created = state.orders.create_order(user.id, &payload).await?;
    Ok(ok_with_message(created, "Order created"))
}

pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<AppResponse<Vec<OrderWithCount>>>> {
    let orders = state.orders.list_for_user(user.id).await?;
    Ok(ok(orders))
}

pub async fn detail(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    let detail = state.orders.detail_for_user(id, user.id).await?;
    Ok(ok(detail))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.orders.cancel_order(id, user.id).await?;
    Ok(ok_with_message(order, "Order cancelled"))
}
