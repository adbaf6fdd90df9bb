//! Cart API Module
//!
//! All routes operate on the signed-in user's cart.
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/cart | GET | required |
//! | /api/cart | POST | required |
//! | /api/cart | DELETE | required |
//! | /api/cart/{id} | PUT | required |
//! | /api/cart/{id} | DELETE | required |

mod handler;

use axum::{
    routing::{get, put},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route(
            "/",
            get(handler::view)
                .post(handler::add_item)
                .delete(handler::clear),
        )
        .route(
            "/{id}",
            put(handler::update_quantity).delete(handler::remove_item),
        )
}
