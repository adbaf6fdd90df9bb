//! Authentication module
//!
//! - `jwt`: token generation and validation
//! - `middleware`: request authentication / admin authorization
//! - `code_store`: one-time authorization code exchange
//! - `revocation`: per-user credential revocation cutoffs
//! - `cookie`: auth cookie helpers
//! - `service`: account operations

pub mod code_store;
pub mod cookie;
pub mod jwt;
pub mod middleware;
pub mod revocation;
pub mod service;

pub use code_store::AuthCodeStore;
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
pub use revocation::RevocationStore;
pub use service::{
    AuthService, AuthSession, ChangePasswordRequest, ExchangeCodeRequest, LoginRequest,
    RegisterRequest, UserProfile,
};
