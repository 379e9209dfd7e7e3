//! Shared helpers for router-level tests
//!
//! Every test gets its own in-memory database and drives the full axum app
//! through `oneshot`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shop_server::{Config, ServerState, api};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@shop.vn";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Distinct client IPs so per-IP rate limits don't leak between helpers
static NEXT_IP: AtomicU32 = AtomicU32::new(1);

fn next_ip() -> String {
    let n = NEXT_IP.fetch_add(1, Ordering::Relaxed);
    format!("10.{}.{}.{}", (n >> 16) & 0xff, (n >> 8) & 0xff, n & 0xff)
}

pub struct TestApp {
    pub state: ServerState,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::for_tests()).await
    }

    pub async fn with_config(mut config: Config) -> Self {
        config.admin_email = Some(ADMIN_EMAIL.into());
        config.admin_password = Some(ADMIN_PASSWORD.into());
        let state = ServerState::in_memory(config).await.unwrap();
        Self::from_state(state)
    }

    pub fn from_state(state: ServerState) -> Self {
        let router = api::build_app(&state);
        Self { state, router }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// POST with an explicit client IP (`x-forwarded-for`)
    pub async fn post_from(&self, ip: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post_from(
                &next_ip(),
                "/api/auth/login",
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register a customer and return its token
    pub async fn customer_token(&self, email: &str) -> String {
        let (status, body) = self
            .post_from(
                &next_ip(),
                "/api/auth/register",
                json!({
                    "email": email,
                    "password": "customer-password",
                    "full_name": "Nguyễn Văn A",
                    "phone": "0901234567"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_category(&self, token: &str, name: &str, parent_id: Option<i64>) -> Value {
        let (status, body) = self
            .post(
                "/api/admin/categories",
                Some(token),
                json!({ "name": name, "parent_id": parent_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create category failed: {body}");
        body
    }

    pub async fn create_product(&self, token: &str, payload: Value) -> Value {
        let (status, body) = self.post("/api/admin/products", Some(token), payload).await;
        assert_eq!(status, StatusCode::OK, "create product failed: {body}");
        body
    }

    /// Store settings with every payment method configured
    pub async fn configure_payments(&self, token: &str, shipping_fee: f64) {
        let (status, body) = self
            .put(
                "/api/admin/settings",
                Some(token),
                json!({
                    "site_name": "Shop",
                    "currency": "VND",
                    "shipping_fee": shipping_fee,
                    "payment_methods": ["COD", "BANK_TRANSFER", "PAYPAL", "CRYPTO"],
                    "bank": {
                        "bank_bin": "970436",
                        "bank_name": "Vietcombank",
                        "account_no": "0123456789",
                        "account_name": "SHOP ONLINE"
                    },
                    "paypal": { "currency": "USD", "exchange_rate": 25000.0 },
                    "crypto": {
                        "wallet_address": "0xabc0000000000000000000000000000000000001",
                        "chain_id": 1,
                        "fiat_per_token": 50000000.0,
                        "symbol": "ETH",
                        "min_confirmations": 0
                    }
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "settings failed: {body}");
    }
}

/// Error code of an error body
pub fn code(body: &Value) -> u64 {
    body["code"].as_u64().unwrap_or_default()
}

pub fn id(body: &Value) -> i64 {
    body["id"].as_i64().unwrap()
}
