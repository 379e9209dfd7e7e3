//! Payment API
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/payments/bank-transfer/{order_id} | GET | VietQR transfer details |
//! | /api/payments/paypal/{order_id} | POST | create the PayPal order |
//! | /api/payments/paypal/{order_id}/capture | POST | capture after approval |
//! | /api/payments/crypto/{order_id} | GET | wallet and exact amount |
//! | /api/payments/crypto/{order_id}/verify | POST | verify a transaction hash |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/payments/bank-transfer/{order_id}", get(handler::bank_transfer))
        .route("/api/payments/paypal/{order_id}", post(handler::paypal_create))
        .route("/api/payments/paypal/{order_id}/capture", post(handler::paypal_capture))
        .route("/api/payments/crypto/{order_id}", get(handler::crypto_details))
        .route("/api/payments/crypto/{order_id}/verify", post(handler::crypto_verify))
}
