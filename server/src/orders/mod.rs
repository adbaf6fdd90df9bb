//! Order domain: checkout, the status lifecycle and stock accounting

mod error;
mod service;

pub use error::{OrderError, OrderResult};
pub use service::{
    generate_order_number, shipping_fee_for, CreateOrderRequest, CreatedOrder, OrderDetail,
    OrderService, FLAT_SHIPPING_FEE, FREE_SHIPPING_THRESHOLD,
};
