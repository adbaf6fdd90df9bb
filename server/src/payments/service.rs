//! Payment reconciliation
//!
//! Ordering discipline for every mutation here: talk to the gateway first,
//! commit locally last. A gateway failure leaves the order untouched; a
//! local CAS failure after a gateway success is reported as a conflict and
//! logged loudly, since it means a concurrent call won the swap.

use super::gateway::{GatewayError, PaymentGateway};
use crate::db::models::{Order, OrderStatus};
use crate::db::repository::{self, RepoError};
use crate::orders::{OrderError, OrderService};
use crate::utils::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Which external gateway a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Toss,
    Naver,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Toss => "toss",
            Provider::Naver => "naver",
        }
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toss" => Ok(Provider::Toss),
            "naver" => Ok(Provider::Naver),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment amount does not match the order total")]
    AmountMismatch,

    #[error("Order is not awaiting payment (status: {0})")]
    NotPending(OrderStatus),

    #[error("Order has no captured payment (status: {0})")]
    NotPaid(OrderStatus),

    #[error("Order has no payment key on record")]
    MissingPaymentKey,

    #[error("Payment gateway is not configured")]
    Unconfigured,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type PaymentResult<T> = Result<T, PaymentError>;

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::AmountMismatch
            | PaymentError::NotPending(_)
            | PaymentError::NotPaid(_)
            | PaymentError::MissingPaymentKey => AppError::Conflict(e.to_string()),
            PaymentError::Unconfigured | PaymentError::Gateway(GatewayError::Unconfigured) => {
                AppError::Upstream("Payment gateway is not configured".to_string())
            }
            PaymentError::Gateway(g) => AppError::Upstream(g.to_string()),
            PaymentError::Order(o) => o.into(),
            PaymentError::Repo(r) => r.into(),
        }
    }
}

/// Checkout summary handed to the payment widget
#[derive(Debug, Clone, Serialize)]
pub struct PaymentPrepare {
    pub order_id: i64,
    pub order_number: String,
    pub amount: i64,
    pub order_name: String,
    /// True when no gateway credentials are configured and the confirm step
    /// will be simulated
    pub test_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub order_id: i64,
    pub payment_key: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelPaymentRequest {
    pub order_id: i64,
    pub reason: Option<String>,
}

/// Read-model of an order's payment state
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatus {
    pub order_id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    pub amount: i64,
    pub payment_key: Option<String>,
    pub payment_method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PaymentService {
    orders: OrderService,
    toss: Arc<dyn PaymentGateway>,
    naver: Arc<dyn PaymentGateway>,
    production: bool,
}

impl PaymentService {
    pub fn new(
        orders: OrderService,
        toss: Arc<dyn PaymentGateway>,
        naver: Arc<dyn PaymentGateway>,
        production: bool,
    ) -> Self {
        Self {
            orders,
            toss,
            naver,
            production,
        }
    }

    fn gateway(&self, provider: Provider) -> &dyn PaymentGateway {
        match provider {
            Provider::Toss => self.toss.as_ref(),
            Provider::Naver => self.naver.as_ref(),
        }
    }

    /// Rehearsal mode is only legal outside production; a production
    /// deployment without gateway credentials is a configuration fault.
    fn check_configured(&self, gateway: &dyn PaymentGateway) -> PaymentResult<bool> {
        if gateway.is_configured() {
            return Ok(true);
        }
        if self.production {
            return Err(PaymentError::Unconfigured);
        }
        tracing::warn!(
            provider = gateway.provider(),
            "Gateway credentials missing, running in rehearsal mode"
        );
        Ok(false)
    }

    /// Summary for the payment widget; only a pending order can start a
    /// payment.
    pub async fn prepare(
        &self,
        provider: Provider,
        order_id: i64,
        user_id: i64,
    ) -> PaymentResult<PaymentPrepare> {
        let order = self.owned_order(order_id, user_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(PaymentError::NotPending(order.status));
        }

        let live = self.check_configured(self.gateway(provider))?;
        let items =
            repository::order::items_for_order(self.orders.pool(), order_id).await?;
        let order_name = order_display_name(&items.iter().map(|i| i.product_name.clone()).collect::<Vec<_>>());

        Ok(PaymentPrepare {
            order_id: order.id,
            order_number: order.order_number,
            amount: order.total_amount,
            order_name,
            test_mode: !live,
        })
    }

    /// Confirm a payment: verify the claimed amount against the stored
    /// total, capture at the gateway, then swap pending → paid locally.
    pub async fn confirm(
        &self,
        provider: Provider,
        user_id: i64,
        req: &ConfirmPaymentRequest,
    ) -> PaymentResult<Order> {
        let order = self.owned_order(req.order_id, user_id).await?;

        if order.status != OrderStatus::Pending {
            return Err(PaymentError::NotPending(order.status));
        }
        if req.amount != order.total_amount {
            tracing::warn!(
                order_id = order.id,
                claimed = req.amount,
                expected = order.total_amount,
                "Rejected payment confirm with mismatched amount"
            );
            return Err(PaymentError::AmountMismatch);
        }

        let gateway = self.gateway(provider);
        let live = self.check_configured(gateway)?;
        if live {
            gateway
                .confirm(&req.payment_key, &order.order_number, req.amount)
                .await?;
        }

        let paid = self
            .orders
            .mark_paid(req.order_id, &req.payment_key, Some(provider.as_str()))
            .await;

        match paid {
            Ok(order) => {
                tracing::info!(
                    order_id = order.id,
                    order_number = %order.order_number,
                    provider = %provider,
                    "Payment confirmed"
                );
                Ok(order)
            }
            Err(OrderError::AlreadyProcessed(status)) => {
                // Gateway capture succeeded but a concurrent confirm won
                // the local swap; surface as a conflict for the operator.
                tracing::error!(
                    order_id = req.order_id,
                    status = %status,
                    provider = %provider,
                    "Gateway confirmed but local order was no longer pending"
                );
                Err(PaymentError::NotPending(status))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Refund a captured payment: gateway first, then cancel the order and
    /// restore stock in one transaction.
    pub async fn cancel(
        &self,
        provider: Provider,
        user_id: i64,
        req: &CancelPaymentRequest,
    ) -> PaymentResult<Order> {
        let order = self.owned_order(req.order_id, user_id).await?;

        if order.status != OrderStatus::Paid {
            return Err(PaymentError::NotPaid(order.status));
        }
        let payment_key = order
            .payment_key
            .as_deref()
            .ok_or(PaymentError::MissingPaymentKey)?;

        let reason = req.reason.as_deref().unwrap_or("customer request");

        let gateway = self.gateway(provider);
        let live = self.check_configured(gateway)?;
        if live {
            gateway.cancel(payment_key, reason).await?;
        }

        let cancelled = self.orders.cancel_paid_order(req.order_id).await?;
        tracing::info!(
            order_id = cancelled.id,
            order_number = %cancelled.order_number,
            provider = %provider,
            "Payment refunded, order cancelled"
        );
        Ok(cancelled)
    }

    pub async fn status(&self, order_id: i64, user_id: i64) -> PaymentResult<PaymentStatus> {
        let order = self.owned_order(order_id, user_id).await?;
        Ok(PaymentStatus {
            order_id: order.id,
            order_number: order.order_number,
            status: order.status,
            amount: order.total_amount,
            payment_key: order.payment_key,
            payment_method: order.payment_method,
            paid_at: order.paid_at,
        })
    }

    async fn owned_order(&self, order_id: i64, user_id: i64) -> PaymentResult<Order> {
        repository::order::find_by_id_and_user(self.orders.pool(), order_id, user_id)
            .await?
            .ok_or(PaymentError::Order(OrderError::NotFound))
    }
}

/// "첫 상품명 외 N건" when the order has more than one line
pub fn order_display_name(names: &[String]) -> String {
    match names {
        [] => "주문".to_string(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{first} 외 {}건", rest.len()),
    }
}
