//! PayPal integration via REST API v2 (no SDK dependency)
//!
//! Flow: the storefront asks us to create a PayPal order, sends the buyer to
//! the approve link, then asks us to capture. The capture response is
//! checked against the shop order before anything is marked paid.

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::PaymentError;
use crate::core::config::PaypalConfig;
use crate::utils::money::{format_2dp, to_decimal};

/// Refresh the access token this long before PayPal expires it
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

/// `POST /v2/checkout/orders` response (fields we use)
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl CreatedOrder {
    /// Buyer approval link (`approve`, or `payer-action` for newer flows)
    pub fn approve_url(&self) -> Option<String> {
        self.links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Amount {
    pub currency_code: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Capture {
    pub id: String,
    pub status: String,
    pub amount: Amount,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapturePayments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseUnit {
    pub reference_id: Option<String>,
    #[serde(default)]
    pub payments: CapturePayments,
}

/// `POST /v2/checkout/orders/{id}/capture` response (fields we use)
#[derive(Debug, Clone, Deserialize)]
pub struct CapturedOrder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
}

/// PayPal REST client with a cached OAuth token
pub struct PaypalClient {
    http: reqwest::Client,
    config: PaypalConfig,
    token: Mutex<Option<CachedToken>>,
}

impl PaypalClient {
    pub fn new(http: reqwest::Client, config: PaypalConfig) -> Self {
        Self {
            http,
            config,
            token: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.trim_end_matches('/'), path)
    }

    /// Client-credentials token, reused until shortly before it expires
    async fn access_token(&self) -> Result<String, PaymentError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN
        {
            return Ok(token.value.clone());
        }

        let resp = self
            .http
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!(
                "OAuth token request failed ({status}): {body}"
            )));
        }

        let token: TokenResponse = resp.json().await?;
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        tracing::debug!(expires_in = token.expires_in, "PayPal access token refreshed");
        Ok(token.access_token)
    }

    /// Create a CAPTURE-intent order for `reference_id` (the shop order code)
    pub async fn create_order(
        &self,
        reference_id: &str,
        currency: &str,
        amount: &str,
    ) -> Result<CreatedOrder, PaymentError> {
        let token = self.access_token().await?;
        let body = json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": reference_id,
                "amount": { "currency_code": currency, "value": amount }
            }]
        });

        let resp = self
            .http
            .post(self.url("/v2/checkout/orders"))
            .bearer_auth(token)
            .header("PayPal-Request-Id", request_id(reference_id, currency, amount))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!(
                "Create order failed ({status}): {body}"
            )));
        }
        Ok(resp.json().await?)
    }

    /// Capture an approved order. Returns the parsed response and its raw JSON.
    pub async fn capture_order(
        &self,
        paypal_order_id: &str,
    ) -> Result<(CapturedOrder, String), PaymentError> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .post(self.url(&format!("/v2/checkout/orders/{paypal_order_id}/capture")))
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .body("{}")
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;
        if !status.is_success() {
            return Err(PaymentError::Provider(format!(
                "Capture failed ({status}): {raw}"
            )));
        }
        let captured: CapturedOrder = serde_json::from_str(&raw)
            .map_err(|e| PaymentError::Transport(format!("Unreadable capture response: {e}")))?;
        Ok((captured, raw))
    }
}

/// Idempotency key: retries of the same order and amount reuse the PayPal order
fn request_id(reference_id: &str, currency: &str, amount: &str) -> String {
    let digest = Sha256::digest(format!("{reference_id}:{currency}:{amount}").as_bytes());
    hex::encode(digest)
}

/// Order total converted to the PayPal currency, `total / exchange_rate`
///
/// `exchange_rate` is store currency per one unit of PayPal currency.
pub fn convert_amount(total: f64, exchange_rate: f64) -> Result<Decimal, PaymentError> {
    if !exchange_rate.is_finite() || exchange_rate <= 0.0 {
        return Err(PaymentError::NotConfigured("paypal exchange rate"));
    }
    let amount = to_decimal(total) / to_decimal(exchange_rate);
    Ok(crate::utils::money::round(amount))
}

/// Check a capture against the shop order. Returns the capture id.
pub fn verify_capture(
    captured: &CapturedOrder,
    order_code: &str,
    expected_amount: Decimal,
    currency: &str,
) -> Result<String, PaymentError> {
    if captured.status != "COMPLETED" {
        return Err(PaymentError::Verification(format!(
            "PayPal order status is {}",
            captured.status
        )));
    }

    let unit = captured
        .purchase_units
        .iter()
        .find(|u| u.reference_id.as_deref() == Some(order_code))
        .ok_or_else(|| PaymentError::Verification("Reference id does not match order".into()))?;

    let capture = unit
        .payments
        .captures
        .iter()
        .find(|c| c.status == "COMPLETED")
        .ok_or_else(|| PaymentError::Verification("No completed capture".into()))?;

    if !capture.amount.currency_code.eq_ignore_ascii_case(currency) {
        return Err(PaymentError::Verification(format!(
            "Currency {} does not match {currency}",
            capture.amount.currency_code
        )));
    }

    let paid: Decimal = capture
        .amount
        .value
        .parse()
        .map_err(|_| PaymentError::Verification("Unreadable captured amount".into()))?;
    if crate::utils::money::round(paid) != expected_amount {
        return Err(PaymentError::Verification(format!(
            "Captured {} but expected {}",
            capture.amount.value,
            format_2dp(expected_amount)
        )));
    }

    Ok(capture.id.clone())
}
