//! Payment Model
//!
//! One row per provider transaction. `provider_ref` (PayPal order id, EVM
//! transaction hash) is unique so a transaction can only settle one order.

use super::order::PaymentMethod;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentRecordStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub method: PaymentMethod,
    pub provider_ref: Option<String>,
    /// Amount in `currency` (not necessarily the store currency)
    pub amount: f64,
    pub currency: String,
    pub status: PaymentRecordStatus,
    /// Provider response kept for reconciliation
    pub raw: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Bank transfer instructions with a VietQR image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankTransferInstructions {
    pub order_code: String,
    pub bank_name: String,
    pub account_no: String,
    pub account_name: String,
    pub amount: f64,
    /// Transfer memo the customer must enter
    pub content: String,
    pub qr_url: String,
}

/// PayPal order created for a shop order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaypalCheckout {
    pub paypal_order_id: String,
    pub approve_url: Option<String>,
    pub amount: String,
    pub currency: String,
}

/// Wallet payment instructions shown to a MetaMask user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoInstructions {
    pub order_code: String,
    pub wallet_address: String,
    pub chain_id: u64,
    pub symbol: String,
    /// Expected value in wei, decimal string
    pub amount_wei: String,
    /// Same value as a 0x-prefixed hex quantity for `eth_sendTransaction`
    pub amount_hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoVerifyRequest {
    pub tx_hash: String,
}

/// Payment step returned with a freshly placed order
///
/// PayPal orders are created on demand through the PayPal endpoint and cash
/// on delivery needs no step, so both come back as `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentInstructions {
    BankTransfer(BankTransferInstructions),
    Crypto(CryptoInstructions),
}

/// `POST /api/checkout` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order: super::order::Order,
    pub payment: Option<PaymentInstructions>,
}
