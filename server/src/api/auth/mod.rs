//! Auth API Module
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/auth/register | POST | none |
//! | /api/auth/login | POST | none |
//! | /api/auth/exchange-code | POST | none |
//! | /api/auth/logout | POST | required |
//! | /api/auth/me | GET | required |
//! | /api/auth/me | DELETE | required |
//! | /api/auth/password | PUT | required |
//! | /api/auth/code | POST | required |

mod handler;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
        .route("/exchange-code", post(handler::exchange_code))
        .route("/logout", post(handler::logout))
        .route("/me", get(handler::me).delete(handler::delete_account))
        .route("/password", put(handler::change_password))
        .route("/code", post(handler::issue_code))
}
