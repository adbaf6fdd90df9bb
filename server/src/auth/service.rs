//! Account operations: registration, login, credential changes and the
//! one-time code handoff used by OAuth-style redirect flows.

use super::code_store::AuthCodeStore;
use super::jwt::JwtService;
use super::revocation::RevocationStore;
use crate::db::models::User;
use crate::db::repository;
use crate::utils::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeCodeRequest {
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Public projection of an account
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    jwt: Arc<JwtService>,
    codes: Arc<AuthCodeStore>,
    revocations: Arc<RevocationStore>,
}

impl AuthService {
    pub fn new(
        pool: SqlitePool,
        jwt: Arc<JwtService>,
        codes: Arc<AuthCodeStore>,
        revocations: Arc<RevocationStore>,
    ) -> Self {
        Self {
            pool,
            jwt,
            codes,
            revocations,
        }
    }

    pub async fn register(&self, req: &RegisterRequest) -> AppResult<AuthSession> {
        let hash = User::hash_password(&req.password)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?;

        let user = repository::user::create(&self.pool, &req.email, &hash, &req.name).await?;
        tracing::info!(user_id = user.id, "Account registered");
        self.session_for(user)
    }

    /// The same error covers an unknown email and a wrong password, so the
    /// response never reveals which one it was.
    pub async fn login(&self, req: &LoginRequest) -> AppResult<AuthSession> {
        let user = repository::user::find_by_email(&self.pool, &req.email)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        let ok = user
            .verify_password(&req.password)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))?;
        if !ok {
            return Err(AppError::invalid_credentials());
        }

        tracing::info!(user_id = user.id, "Login succeeded");
        self.session_for(user)
    }

    /// Mint a one-time code for a signed-in principal; a redirect flow
    /// exchanges it for the underlying token within its TTL.
    pub fn issue_code(&self, token: String) -> String {
        self.codes.issue(token)
    }

    /// Destructive exchange: the code is consumed whether or not it was
    /// still live.
    pub async fn exchange_code(&self, req: &ExchangeCodeRequest) -> AppResult<AuthSession> {
        let token = self
            .codes
            .exchange(&req.code)
            .ok_or(AppError::Unauthorized)?;

        let claims = self
            .jwt
            .validate_token(&token)
            .map_err(|_| AppError::Unauthorized)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized)?;

        let user = repository::user::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthSession {
            token,
            user: user.into(),
        })
    }

    pub async fn profile(&self, user_id: i64) -> AppResult<UserProfile> {
        let user = repository::user::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(user.into())
    }

    /// Change the password and revoke every previously issued token.
    pub async fn change_password(
        &self,
        user_id: i64,
        req: &ChangePasswordRequest,
    ) -> AppResult<()> {
        let user = repository::user::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let ok = user
            .verify_password(&req.current_password)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))?;
        if !ok {
            return Err(AppError::invalid_credentials());
        }

        let hash = User::hash_password(&req.new_password)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?;
        repository::user::update_password(&self.pool, user_id, &hash).await?;

        self.revocations.revoke_all(user_id);
        tracing::info!(user_id, "Password changed, existing tokens revoked");
        Ok(())
    }

    /// Withdraw the account: anonymize the row and revoke every token.
    pub async fn delete_account(&self, user_id: i64) -> AppResult<()> {
        repository::user::anonymize(&self.pool, user_id).await?;
        self.revocations.revoke_all(user_id);
        tracing::info!(user_id, "Account withdrawn, existing tokens revoked");
        Ok(())
    }

    fn session_for(&self, user: User) -> AppResult<AuthSession> {
        let token = self
            .jwt
            .generate_token(user.id, &user.email, &user.role)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))?;
        Ok(AuthSession {
            token,
            user: user.into(),
        })
    }
}
