//! VietQR bank transfer images
//!
//! `https://img.vietqr.io/image/{bank_bin}-{account_no}-{template}.png`
//! renders a QR code any Vietnamese banking app can scan, pre-filled with
//! amount, memo and account holder.

use rust_decimal::prelude::*;
use shared::models::{BankSettings, BankTransferInstructions, Order};

use crate::utils::money::to_decimal;

const BASE_URL: &str = "https://img.vietqr.io/image";

/// QR image URL for a transfer of `amount` with memo `content`
pub fn image_url(bank: &BankSettings, amount: f64, content: &str) -> String {
    // Whole currency units, VND has no minor unit
    let whole = to_decimal(amount)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_default();

    let template = if bank.template.trim().is_empty() {
        "compact2"
    } else {
        bank.template.trim()
    };
    let base = format!(
        "{BASE_URL}/{}-{}-{}.png",
        bank.bank_bin.trim(),
        bank.account_no.trim(),
        template
    );

    let params = [
        ("amount", whole.to_string()),
        ("addInfo", content.to_string()),
        ("accountName", bank.account_name.clone()),
    ];
    match reqwest::Url::parse_with_params(&base, &params) {
        Ok(url) => url.to_string(),
        // Only reachable with a bank BIN or account that is not URL-safe
        Err(e) => {
            tracing::warn!(error = %e, "Invalid VietQR base URL");
            base
        }
    }
}

/// Transfer instructions for an order; the memo is the order code
pub fn instructions(bank: &BankSettings, order: &Order) -> BankTransferInstructions {
    BankTransferInstructions {
        order_code: order.order_code.clone(),
        bank_name: bank.bank_name.clone(),
        account_no: bank.account_no.clone(),
        account_name: bank.account_name.clone(),
        amount: order.total,
        content: order.order_code.clone(),
        qr_url: image_url(bank, order.total, &order.order_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> BankSettings {
        BankSettings {
            bank_bin: "970436".into(),
            bank_name: "Vietcombank".into(),
            account_no: "0123456789".into(),
            account_name: "NGUYEN VAN A".into(),
            template: "compact2".into(),
        }
    }

    #[test]
    fn test_image_url() {
        let url = image_url(&bank(), 250000.0, "DH240101ABCDEF");
        assert_eq!(
            url,
            "https://img.vietqr.io/image/970436-0123456789-compact2.png?amount=250000&addInfo=DH240101ABCDEF&accountName=NGUYEN+VAN+A"
        );
    }

    #[test]
    fn test_amount_is_whole_units() {
        let url = image_url(&bank(), 99999.5, "X");
        assert!(url.contains("amount=100000&"));
    }

    #[test]
    fn test_blank_template_falls_back() {
        let mut bank = bank();
        bank.template = " ".into();
        assert!(image_url(&bank, 1.0, "X").contains("-compact2.png?"));
    }
}
