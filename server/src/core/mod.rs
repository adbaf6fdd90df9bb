//! Core module: configuration, state and server lifecycle
//!
//! - [`Config`]: server configuration
//! - [`ServerState`]: shared service graph
//! - [`Server`]: HTTP server
//! - [`ServerError`]: lifecycle errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
