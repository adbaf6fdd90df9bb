//! Payment API Module
//!
//! `{provider}` is `toss` or `naver`. Prepare/confirm/cancel follow the
//! gateway-first discipline in the payment service.
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/payments/{provider}/prepare/{order_id} | GET | required |
//! | /api/payments/{provider}/confirm | POST | required |
//! | /api/payments/{provider}/cancel | POST | required |
//! | /api/payments/status/{order_id} | GET | required |

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{provider}/prepare/{order_id}", get(handler::prepare))
        .route("/{provider}/confirm", post(handler::confirm))
        .route("/{provider}/cancel", post(handler::cancel))
        .route("/status/{order_id}", get(handler::status))
}
