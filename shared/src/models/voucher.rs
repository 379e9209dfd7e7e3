//! Voucher Model

use super::order::{CheckoutItem, PaymentMethod};
use serde::{Deserialize, Serialize};

/// How a voucher's `discount_value` is applied
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum DiscountType {
    /// `discount_value` percent of the eligible subtotal (e.g. 10 = 10%)
    Percentage,
    /// Flat amount in store currency
    FixedAmount,
}

/// Voucher entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Voucher {
    pub id: i64,
    /// Upper-cased, unique
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    /// Cap for percentage vouchers
    pub max_discount: Option<f64>,
    pub min_order_value: f64,
    /// Total redemptions allowed, unlimited when absent
    pub usage_limit: Option<i64>,
    pub used_count: i64,
    pub per_user_limit: Option<i64>,
    /// Restrict to these products, empty means every product
    #[cfg_attr(feature = "db", sqlx(json))]
    pub product_ids: Vec<i64>,
    /// Restrict to these payment methods, empty means every method
    #[cfg_attr(feature = "db", sqlx(json))]
    pub payment_methods: Vec<PaymentMethod>,
    /// Valid from (Unix millis)
    pub starts_at: Option<i64>,
    /// Valid until (Unix millis)
    pub ends_at: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherCreate {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub max_discount: Option<f64>,
    pub min_order_value: Option<f64>,
    pub usage_limit: Option<i64>,
    pub per_user_limit: Option<i64>,
    #[serde(default)]
    pub product_ids: Vec<i64>,
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
    pub starts_at: Option<i64>,
    pub ends_at: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoucherUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<f64>,
    #[serde(default, deserialize_with = "super::category::double_option")]
    pub max_discount: Option<Option<f64>>,
    pub min_order_value: Option<f64>,
    #[serde(default, deserialize_with = "super::category::double_option")]
    pub usage_limit: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::category::double_option")]
    pub per_user_limit: Option<Option<i64>>,
    pub product_ids: Option<Vec<i64>>,
    pub payment_methods: Option<Vec<PaymentMethod>>,
    #[serde(default, deserialize_with = "super::category::double_option")]
    pub starts_at: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::category::double_option")]
    pub ends_at: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

/// Storefront-facing subset of a voucher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PublicVoucher {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub max_discount: Option<f64>,
    pub min_order_value: f64,
    pub ends_at: Option<i64>,
}

/// `POST /api/vouchers/check`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherCheckRequest {
    pub code: String,
    pub items: Vec<CheckoutItem>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherCheckResponse {
    pub code: String,
    pub discount: f64,
    pub eligible_subtotal: f64,
    pub subtotal: f64,
}

/// Admin list row with redemption count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherWithStats {
    #[serde(flatten)]
    pub voucher: Voucher,
    pub redemptions: i64,
}
