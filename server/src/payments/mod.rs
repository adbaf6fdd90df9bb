//! Payment domain: gateway clients and the reconciliation service

mod gateway;
mod service;

pub use gateway::{
    GatewayError, NaverPayCredentials, NaverPayGateway, PaymentGateway, TossGateway,
};
pub use service::{
    order_display_name, CancelPaymentRequest, ConfirmPaymentRequest, PaymentError,
    PaymentPrepare, PaymentResult, PaymentService, PaymentStatus, Provider,
};
