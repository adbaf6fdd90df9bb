//! Payment gateway clients
//!
//! Each provider is hidden behind [`PaymentGateway`] so the reconciliation
//! logic and the tests never talk HTTP directly. An unconfigured gateway is
//! a legal state: the service decides whether that means rehearsal mode or
//! a hard error.

use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

const TOSS_BASE_URL: &str = "https://api.tosspayments.com";
const NAVER_BASE_URL: &str = "https://apis.naver.com";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway is not configured")]
    Unconfigured,

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Gateway request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Transport(e.to_string())
    }
}

/// External payment provider seam
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> &'static str;

    fn is_configured(&self) -> bool;

    /// Confirm (capture) an authorized payment with the provider
    async fn confirm(
        &self,
        payment_key: &str,
        order_number: &str,
        amount: i64,
    ) -> Result<(), GatewayError>;

    /// Refund a captured payment with the provider
    async fn cancel(&self, payment_key: &str, reason: &str) -> Result<(), GatewayError>;
}

/// Toss Payments REST client
pub struct TossGateway {
    client: reqwest::Client,
    secret_key: Option<String>,
    base_url: String,
}

impl TossGateway {
    pub fn new(secret_key: Option<String>) -> Self {
        Self::with_base_url(secret_key, TOSS_BASE_URL.to_string())
    }

    pub fn with_base_url(secret_key: Option<String>, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            secret_key: secret_key.filter(|k| !k.is_empty()),
            base_url,
        }
    }

    // Toss uses HTTP basic auth with the secret key as username and an
    // empty password
    fn auth_header(&self) -> Result<String, GatewayError> {
        let key = self.secret_key.as_deref().ok_or(GatewayError::Unconfigured)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{key}:"));
        Ok(format!("Basic {encoded}"))
    }
}

#[async_trait]
impl PaymentGateway for TossGateway {
    fn provider(&self) -> &'static str {
        "toss"
    }

    fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    async fn confirm(
        &self,
        payment_key: &str,
        order_number: &str,
        amount: i64,
    ) -> Result<(), GatewayError> {
        let auth = self.auth_header()?;
        let response = self
            .client
            .post(format!("{}/v1/payments/confirm", self.base_url))
            .header("Authorization", auth)
            .json(&serde_json::json!({
                "paymentKey": payment_key,
                "orderId": order_number,
                "amount": amount,
            }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("confirm rejected")
                .to_string();
            return Err(GatewayError::Declined(message));
        }

        match body.get("status").and_then(Value::as_str) {
            Some("DONE") => Ok(()),
            Some(other) => Err(GatewayError::Declined(format!(
                "unexpected payment status: {other}"
            ))),
            None => Err(GatewayError::Transport(
                "confirm response missing status".to_string(),
            )),
        }
    }

    async fn cancel(&self, payment_key: &str, reason: &str) -> Result<(), GatewayError> {
        let auth = self.auth_header()?;
        let response = self
            .client
            .post(format!(
                "{}/v1/payments/{payment_key}/cancel",
                self.base_url
            ))
            .header("Authorization", auth)
            .json(&serde_json::json!({ "cancelReason": reason }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("cancel rejected")
                .to_string();
            return Err(GatewayError::Declined(message));
        }
        Ok(())
    }
}

/// Naver Pay credentials
#[derive(Debug, Clone)]
pub struct NaverPayCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub chain_id: String,
    pub partner_id: String,
}

/// Naver Pay REST client
pub struct NaverPayGateway {
    client: reqwest::Client,
    credentials: Option<NaverPayCredentials>,
    base_url: String,
}

impl NaverPayGateway {
    pub fn new(credentials: Option<NaverPayCredentials>) -> Self {
        Self::with_base_url(credentials, NAVER_BASE_URL.to_string())
    }

    pub fn with_base_url(credentials: Option<NaverPayCredentials>, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            credentials,
            base_url,
        }
    }

    fn creds(&self) -> Result<&NaverPayCredentials, GatewayError> {
        self.credentials.as_ref().ok_or(GatewayError::Unconfigured)
    }
}

#[async_trait]
impl PaymentGateway for NaverPayGateway {
    fn provider(&self) -> &'static str {
        "naver"
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn confirm(
        &self,
        payment_key: &str,
        _order_number: &str,
        _amount: i64,
    ) -> Result<(), GatewayError> {
        let creds = self.creds()?;
        let response = self
            .client
            .post(format!(
                "{}/{}/naverpay/payments/v2.2/apply/payment",
                self.base_url, creds.partner_id
            ))
            .header("X-Naver-Client-Id", &creds.client_id)
            .header("X-Naver-Client-Secret", &creds.client_secret)
            .header("X-NaverPay-Chain-Id", &creds.chain_id)
            .form(&[("paymentId", payment_key)])
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let code = body.get("code").and_then(Value::as_str);

        if !status.is_success() || code != Some("Success") {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("apply/payment rejected")
                .to_string();
            return Err(GatewayError::Declined(message));
        }
        Ok(())
    }

    async fn cancel(&self, payment_key: &str, reason: &str) -> Result<(), GatewayError> {
        let creds = self.creds()?;
        let response = self
            .client
            .post(format!(
                "{}/{}/naverpay/payments/v1/cancel",
                self.base_url, creds.partner_id
            ))
            .header("X-Naver-Client-Id", &creds.client_id)
            .header("X-Naver-Client-Secret", &creds.client_secret)
            .header("X-NaverPay-Chain-Id", &creds.chain_id)
            .form(&[
                ("paymentId", payment_key),
                ("cancelReason", reason),
                ("cancelRequester", "2"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let code = body.get("code").and_then(Value::as_str);

        if !status.is_success() || code != Some("Success") {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("cancel rejected")
                .to_string();
            return Err(GatewayError::Declined(message));
        }
        Ok(())
    }
}
