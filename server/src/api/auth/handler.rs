//! Auth API Handlers
//!
//! Login and registration both return the token in the body and set it as
//! an HttpOnly cookie, so browser and non-browser clients work the same
//! way.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use validator::Validate;

use crate::auth::cookie::{auth_cookie, clear_cookie};
use crate::auth::{
    AuthSession, ChangePasswordRequest, CurrentUser, ExchangeCodeRequest, LoginRequest,
    RegisterRequest, UserProfile,
};
use crate::core::ServerState;
use crate::utils::{ok, ok_with_message, AppError, AppResult};

fn session_response(state: &ServerState, session: AuthSession) -> Response {
    let cookie = auth_cookie(
        &session.token,
        state.jwt_service.expiration_seconds(),
        state.config.cookie_secure,
    );
    ([(header::SET_COOKIE, cookie)], ok(session)).into_response()
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Response> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let session = state.auth.register(&payload).await?;
    Ok(session_response(&state, session))
}

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Response> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let session = state.auth.login(&payload).await?;
    Ok(session_response(&state, session))
}

/// Trade a one-time code for the session it was minted from
pub async fn exchange_code(
    State(state): State<ServerState>,
    Json(payload): Json<ExchangeCodeRequest>,
) -> AppResult<Response> {
    let session = state.auth.exchange_code(&payload).await?;
    Ok(session_response(&state, session))
}

pub async fn logout(State(state): State<ServerState>) -> Response {
    let cookie = clear_cookie(state.config.cookie_secure);
    (
        [(header::SET_COOKIE, cookie)],
        ok_with_message((), "Logged out"),
    )
        .into_response()
}

pub async fn me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    let profile = state.auth.profile(user.id).await?;
    Ok(ok::<UserProfile>(profile))
}

pub async fn change_password(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Response> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    state.auth.change_password(user.id, &payload).await?;
    // Existing tokens are revoked; drop the cookie as well
    let cookie = clear_cookie(state.config.cookie_secure);
    Ok((
        [(header::SET_COOKIE, cookie)],
        ok_with_message((), "Password changed, please login again"),
    )
        .into_response())
}

pub async fn delete_account(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Response> {
    state.auth.delete_account(user.id).await?;
    let cookie = clear_cookie(state.config.cookie_secure);
    Ok((
        [(header::SET_COOKIE, cookie)],
        ok_with_message((), "Account withdrawn"),
    )
        .into_response())
}

#[derive(Serialize)]
pub struct IssuedCode {
    code: String,
    expires_in_secs: u64,
}

/// Mint a one-time code bound to the caller's current token, for handing a
/// session across a redirect.
pub async fn issue_code(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<impl IntoResponse> {
    // Re-issue a token for the principal rather than echoing the inbound one
    let token = state
        .jwt_service
        .generate_token(user.id, &user.email, &user.role)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))?;
    let code = state.auth.issue_code(token);
    Ok(ok(IssuedCode {
        code,
        expires_in_secs: 60,
    }))
}
