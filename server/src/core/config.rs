use crate::auth::JwtConfig;
use crate::payments::NaverPayCredentials;

/// Server configuration
///
/// Every item can be overridden through an environment variable:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Working directory (database, logs) |
/// | HTTP_PORT | 8080 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | COOKIE_SECURE | auto | Force the Secure flag on the auth cookie |
/// | TOSS_SECRET_KEY | unset | Toss Payments secret key |
/// | NAVER_PAY_CLIENT_ID | unset | Naver Pay client id |
/// | NAVER_PAY_CLIENT_SECRET | unset | Naver Pay client secret |
/// | NAVER_PAY_CHAIN_ID | unset | Naver Pay chain id |
/// | NAVER_PAY_PARTNER_ID | unset | Naver Pay partner id |
///
/// Unset gateway credentials put that provider into rehearsal mode, which
/// the payment service only accepts outside production.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database file and log output
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    /// JWT signing configuration
    pub jwt: JwtConfig,
    /// Secure flag for the auth cookie
    pub cookie_secure: bool,
    /// Toss Payments secret key
    pub toss_secret_key: Option<String>,
    /// Naver Pay credentials; None unless all four variables are set
    pub naver_pay: Option<NaverPayCredentials>,
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults above.
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let cookie_secure = std::env::var("COOKIE_SECURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(environment == "production");

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment,
            jwt: JwtConfig::default(),
            cookie_secure,
            toss_secret_key: std::env::var("TOSS_SECRET_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            naver_pay: naver_pay_from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Path of the SQLite database file inside the working directory
    pub fn db_path(&self) -> String {
        format!("{}/gugarden.db", self.work_dir)
    }
}

fn naver_pay_from_env() -> Option<NaverPayCredentials> {
    let get = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
    Some(NaverPayCredentials {
        client_id: get("NAVER_PAY_CLIENT_ID")?,
        client_secret: get("NAVER_PAY_CLIENT_SECRET")?,
        chain_id: get("NAVER_PAY_CHAIN_ID")?,
        partner_id: get("NAVER_PAY_PARTNER_ID")?,
    })
}
