//! Order API Module
//!
//! Customer-facing checkout and order history. Every route is scoped to
//! the signed-in user; orders owned by someone else read as not found.
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/orders | POST | required |
//! | /api/orders | GET | required |
//! | /api/orders/{id} | GET | required |
//! | /api/orders/{id}/cancel | POST | required |

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::detail))
        .route("/{id}/cancel", post(handler::cancel))
}
