//! Authentication middleware
//!
//! Extracts the JWT from `Authorization: Bearer <token>` or the auth cookie,
//! validates it, consults the revocation store, and injects [`CurrentUser`]
//! into request extensions.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtService, cookie};
use crate::core::ServerState;
use crate::utils::AppError;

/// Paths that never require a token
fn is_public_api_route(method: &http::Method, path: &str) -> bool {
    matches!(
        path,
        "/api/auth/login" | "/api/auth/register" | "/api/auth/exchange-code" | "/api/health"
    ) || (method == http::Method::GET && path.starts_with("/api/products"))
}

/// Authentication middleware: requires a logged-in user on `/api/` routes
///
/// | Failure | Status |
/// |---------|--------|
/// | Missing token | 401 Unauthorized |
/// | Expired token | 401 TokenExpired |
/// | Invalid or revoked token | 401 InvalidToken |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // CORS preflight skips auth
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // Non-API routes fall through to their own 404 handling
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if is_public_api_route(req.method(), path) {
        return Ok(next.run(req).await);
    }

    let bearer = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(JwtService::extract_from_header);

    let cookie_token = req
        .headers()
        .get(http::header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(cookie::token_from_cookie_header);

    let token = match bearer.or(cookie_token) {
        Some(token) => token,
        None => {
            tracing::warn!(target: "security", uri = %req.uri(), "Request without credentials");
            return Err(AppError::Unauthorized);
        }
    };

    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        tracing::warn!(target: "security", error = %e, uri = %req.uri(), "Token rejected");
        match e {
            crate::auth::JwtError::ExpiredToken => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        }
    })?;

    let user = CurrentUser::try_from(claims).map_err(|_| AppError::InvalidToken)?;

    // Tokens issued before the user's revocation cutoff are dead even if
    // their signature and expiry are fine
    if state.revocations.is_revoked(user.id, user.token_issued_at) {
        tracing::warn!(target: "security", user_id = user.id, "Revoked token presented");
        return Err(AppError::InvalidToken);
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Authorization middleware for admin routes; layered after [`require_auth`]
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthorized)?;

    if !user.is_admin() {
        return Err(AppError::Forbidden("Admin permission required".to_string()));
    }

    Ok(next.run(req).await)
}
