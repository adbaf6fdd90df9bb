//! API routing module
//!
//! # Structure
//!
//! - [`health`]: liveness check
//! - [`auth`]: registration, login, one-time code exchange, account
//! - [`products`]: catalog reads, admin product creation
//! - [`cart`]: the signed-in user's cart
//! - [`orders`]: checkout and order history
//! - [`admin`]: back-office order management
//! - [`payments`]: payment prepare / confirm / cancel

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;

use axum::http::HeaderName;
use axum::{middleware, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Build the router without state or middleware
pub fn build_router() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(admin::router())
        .merge(payments::router())
}

/// Assemble the application: routes, authentication and the tower-http
/// middleware stack.
pub fn build_app(state: ServerState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    build_router()
        // require_auth skips the public routes internally
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}
