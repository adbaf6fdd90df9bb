//! Gugarden Server - order fulfillment and payment backend for the
//! Gugarden storefront
//!
//! # Module structure
//!
//! ```text
//! server/src/
//! ├── core/          # configuration, state, server lifecycle
//! ├── auth/          # JWT auth, one-time codes, revocation
//! ├── db/            # SQLite pool, models, repositories
//! ├── orders/        # checkout, order lifecycle, stock accounting
//! ├── payments/      # gateway clients and reconciliation
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # errors, response envelope, logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod payments;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::OrderService;
pub use payments::PaymentService;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env`, make sure the working directory exists and start logging
pub fn setup_environment() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
    std::fs::create_dir_all(&work_dir)?;

    let log_dir = format!("{work_dir}/logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    init_logger_with_file(Some(&log_level), Some(&log_dir));

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______
  / ____/_  ______ _____ __________/ /__  ____
 / / __/ / / / __ `/ __ `/ ___/ __  / _ \/ __ \
/ /_/ / /_/ / /_/ / /_/ / /  / /_/ /  __/ / / /
\____/\__,_/\__, /\__,_/_/   \__,_/\___/_/ /_/
           /____/
    "#
    );
}
