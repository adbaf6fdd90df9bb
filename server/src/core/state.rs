use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{AuthCodeStore, AuthService, JwtService, RevocationStore};
use crate::core::error::{Result, ServerError};
use crate::core::Config;
use crate::db::DbService;
use crate::orders::OrderService;
use crate::payments::{NaverPayGateway, PaymentService, TossGateway};

/// Shared application state
///
/// One instance is built at startup and cloned into every handler through
/// axum's `State` extractor. All heavyweight members are behind `Arc`, so a
/// clone is a handful of pointer bumps.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    pub auth_codes: Arc<AuthCodeStore>,
    pub revocations: Arc<RevocationStore>,
    pub auth: AuthService,
    pub orders: OrderService,
    pub payments: PaymentService,
}

impl ServerState {
    /// Build the full service graph from configuration
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir).map_err(|e| {
            ServerError::Config(format!(
                "Failed to create work dir {}: {e}",
                config.work_dir
            ))
        })?;

        let db = DbService::new(&config.db_path())
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let auth_codes = Arc::new(AuthCodeStore::new());
        let revocations = Arc::new(RevocationStore::new());

        let auth = AuthService::new(
            db.pool.clone(),
            jwt_service.clone(),
            auth_codes.clone(),
            revocations.clone(),
        );

        let orders = OrderService::new(db.pool.clone());
        let payments = PaymentService::new(
            orders.clone(),
            Arc::new(TossGateway::new(config.toss_secret_key.clone())),
            Arc::new(NaverPayGateway::new(config.naver_pay.clone())),
            config.is_production(),
        );

        if config.is_production() && config.toss_secret_key.is_none() {
            tracing::warn!("Running in production without TOSS_SECRET_KEY; Toss payments will fail");
        }

        Ok(Self {
            config: config.clone(),
            db,
            jwt_service,
            auth_codes,
            revocations,
            auth,
            orders,
            payments,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// Spawn the periodic sweepers for the in-memory stores
    pub fn start_background_tasks(&self) {
        self.auth_codes.spawn_sweeper();
        self.revocations.spawn_sweeper();
        tracing::info!("Background sweepers started (auth codes, revocations)");
    }
}
