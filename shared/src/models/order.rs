//! Order Model

use serde::{Deserialize, Serialize};

/// Order lifecycle
///
/// `PENDING -> CONFIRMED -> SHIPPING -> DELIVERED`, and `CANCELLED` from
/// `PENDING` or `CONFIRMED`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Shipping)
                | (Shipping, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    pub fn is_final(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Failed,
    Refunded,
}

/// How the customer pays
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum PaymentMethod {
    /// Cash on delivery
    Cod,
    /// VietQR bank transfer, confirmed manually
    BankTransfer,
    Paypal,
    /// EVM wallet transfer (MetaMask)
    Crypto,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cod => "COD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Paypal => "PAYPAL",
            PaymentMethod::Crypto => "CRYPTO",
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub order_code: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub subtotal: f64,
    pub discount: f64,
    pub shipping_fee: f64,
    pub total: f64,
    pub voucher_id: Option<i64>,
    pub voucher_code: Option<String>,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub note: Option<String>,
    pub paid_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,

    // -- Relations (populated by application code, skipped by FromRow) --
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Order line, a snapshot of the product at purchase time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub line_total: f64,
}

// =============================================================================
// Checkout payloads
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub note: Option<String>,
}

/// Cart preview (no side effects)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<CheckoutItem>,
    pub voucher_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub voucher_code: Option<String>,
    pub payment_method: PaymentMethod,
    pub shipping: ShippingInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteLine {
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub line_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedVoucher {
    pub id: i64,
    pub code: String,
    pub discount: f64,
    pub eligible_subtotal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub lines: Vec<QuoteLine>,
    pub subtotal: f64,
    pub discount: f64,
    pub shipping_fee: f64,
    pub total: f64,
    pub voucher: Option<AppliedVoucher>,
}

// =============================================================================
// Admin payloads
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Order code prefix or customer phone
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}
