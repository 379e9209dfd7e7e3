//! Site Settings Model
//!
//! A single JSON document edited from the admin panel. Everything the
//! storefront needs at runtime (shipping fee, bank account, exchange rates,
//! wallet) lives here rather than in environment variables.

use super::order::PaymentMethod;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteSettings {
    pub site_name: String,
    pub logo: Option<String>,
    pub contact_email: Option<String>,
    pub hotline: Option<String>,
    pub address: Option<String>,
    /// Store currency (ISO 4217)
    pub currency: String,
    /// Flat shipping fee per order
    pub shipping_fee: f64,
    /// Orders at or above this amount (after discount) ship free
    pub free_shipping_threshold: Option<f64>,
    /// Payment methods offered at checkout
    pub payment_methods: Vec<PaymentMethod>,
    pub bank: Option<BankSettings>,
    pub paypal: Option<PaypalSettings>,
    pub crypto: Option<CryptoSettings>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Shop".to_string(),
            logo: None,
            contact_email: None,
            hotline: None,
            address: None,
            currency: "VND".to_string(),
            shipping_fee: 30_000.0,
            free_shipping_threshold: None,
            payment_methods: vec![PaymentMethod::Cod, PaymentMethod::BankTransfer],
            bank: None,
            paypal: None,
            crypto: None,
        }
    }
}

impl SiteSettings {
    pub fn is_enabled(&self, method: PaymentMethod) -> bool {
        self.payment_methods.contains(&method)
    }
}

/// VietQR receiving account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankSettings {
    /// NAPAS bank BIN (e.g. 970436 for Vietcombank)
    pub bank_bin: String,
    pub bank_name: String,
    pub account_no: String,
    pub account_name: String,
    /// VietQR image template
    #[serde(default = "default_qr_template")]
    pub template: String,
}

fn default_qr_template() -> String {
    "compact2".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaypalSettings {
    /// Currency charged on PayPal
    #[serde(default = "default_paypal_currency")]
    pub currency: String,
    /// Store currency units per one PayPal currency unit (e.g. 25000 VND/USD)
    pub exchange_rate: f64,
}

fn default_paypal_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CryptoSettings {
    /// Merchant wallet (0x-prefixed)
    pub wallet_address: String,
    pub chain_id: u64,
    /// Store currency units per one native token
    pub fiat_per_token: f64,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default)]
    pub min_confirmations: u64,
}

fn default_symbol() -> String {
    "ETH".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let s: SiteSettings = serde_json::from_str(r#"{"site_name":"Lúa Shop"}"#).unwrap();
        assert_eq!(s.site_name, "Lúa Shop");
        assert_eq!(s.currency, "VND");
        assert!(s.is_enabled(PaymentMethod::Cod));
        assert!(!s.is_enabled(PaymentMethod::Paypal));
    }

    #[test]
    fn test_bank_template_default() {
        let b: BankSettings = serde_json::from_str(
            r#"{"bank_bin":"970436","bank_name":"VCB","account_no":"0011","account_name":"SHOP"}"#,
        )
        .unwrap();
        assert_eq!(b.template, "compact2");
    }
}
