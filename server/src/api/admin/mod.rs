//! Admin API Module
//!
//! Back-office order management and product creation. Every route is
//! behind [`require_admin`].
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/admin/orders | GET | admin |
//! | /api/admin/orders/{id} | GET | admin |
//! | /api/admin/orders/{id}/status | PUT | admin |
//! | /api/admin/products | POST | admin |

mod handler;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admin", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders", get(handler::list_orders))
        .route("/orders/{id}", get(handler::order_detail))
        .route("/orders/{id}/status", put(handler::set_order_status))
        .route("/products", post(handler::create_product))
        .route_layer(middleware::from_fn(require_admin))
}
