//! Payment API Handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::str::FromStr;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::payments::{
    CancelPaymentRequest, ConfirmPaymentRequest, PaymentPrepare, PaymentStatus, Provider,
};
use crate::utils::{ok, ok_with_message, AppError, AppResponse, AppResult};

fn parse_provider(raw: &str) -> AppResult<Provider> {
    Provider::from_str(raw)
        .map_err(|_| AppError::Validation(format!("Unknown payment provider: {raw}")))
}

pub async fn prepare(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path((provider, order_id)): Path<(String, i64)>,
) -> AppResult<Json<AppResponse<PaymentPrepare>>> {
    let provider = parse_provider(&provider)?;
    let prepare = state.payments.prepare(provider, order_id, user.id).await?;
    Ok(ok(prepare))
}

pub async fn confirm(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(provider): Path<String>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let provider = parse_provider(&provider)?;
    let order = state.payments.confirm(provider, user.id, &payload).await?;
    Ok(ok_with_message(order, "Payment confirmed"))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(provider): Path<String>,
    Json(payload): Json<CancelPaymentRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let provider = parse_provider(&provider)?;
    let order = state.payments.cancel(provider, user.id, &payload).await?;
    Ok(ok_with_message(order, "Payment cancelled"))
}

pub async fn status(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(order_id): Path<i64>,
) -> AppResult<Json<AppResponse<PaymentStatus>>> {
    let status = state.payments.status(order_id, user.id).await?;
    Ok(ok(status))
}
