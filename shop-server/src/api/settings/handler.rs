//! Site Settings Handlers

use axum::{Json, extract::State};
use shared::models::{PaymentMethod, SiteSettings};

use crate::core::ServerState;
use crate::db::repository::setting;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::{AppError, AppResult, ErrorCode};

fn invalid(field: &str, message: impl Into<String>) -> AppError {
    AppError::with_message(ErrorCode::SettingsInvalid, message).with_detail("field", field)
}

fn positive(value: f64, field: &str) -> AppResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, format!("{field} must be greater than 0")));
    }
    Ok(())
}

fn non_negative(value: f64, field: &str) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("{field} must not be negative")));
    }
    Ok(())
}

/// Reject settings the checkout could not honor
///
/// A payment method can only be enabled together with its configuration.
pub fn validate_settings(settings: &SiteSettings) -> AppResult<()> {
    validate_required_text(&settings.site_name, "site_name", MAX_NAME_LEN)
        .map_err(|e| invalid("site_name", e.message))?;
    validate_required_text(&settings.currency, "currency", MAX_SHORT_TEXT_LEN)
        .map_err(|e| invalid("currency", e.message))?;

    non_negative(settings.shipping_fee, "shipping_fee")?;
    if let Some(threshold) = settings.free_shipping_threshold {
        non_negative(threshold, "free_shipping_threshold")?;
    }
    if settings.payment_methods.is_empty() {
        return Err(invalid("payment_methods", "At least one payment method must be enabled"));
    }

    if let Some(bank) = &settings.bank {
        for (field, value) in [
            ("bank.bank_bin", &bank.bank_bin),
            ("bank.account_no", &bank.account_no),
            ("bank.account_name", &bank.account_name),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, format!("{field} must not be empty")));
            }
        }
    }
    if let Some(paypal) = &settings.paypal {
        positive(paypal.exchange_rate, "paypal.exchange_rate")?;
    }
    if let Some(crypto) = &settings.crypto {
        let address = crypto.wallet_address.trim();
        let is_address = address.len() == 42
            && address.starts_with("0x")
            && address[2..].chars().all(|c| c.is_ascii_hexdigit());
        if !is_address {
            return Err(invalid("crypto.wallet_address", "Wallet address must be 0x + 40 hex chars"));
        }
        positive(crypto.fiat_per_token, "crypto.fiat_per_token")?;
        if crypto.chain_id == 0 {
            return Err(invalid("crypto.chain_id", "chain_id must be set"));
        }
    }

    let missing = settings.payment_methods.iter().find(|method| match method {
        PaymentMethod::Cod => false,
        PaymentMethod::BankTransfer => settings.bank.is_none(),
        PaymentMethod::Paypal => settings.paypal.is_none(),
        PaymentMethod::Crypto => settings.crypto.is_none(),
    });
    if let Some(method) = missing {
        return Err(invalid(
            "payment_methods",
            format!("{} is enabled but not configured", method.as_str()),
        ));
    }
    Ok(())
}

/// GET /api/settings, GET /api/admin/settings
pub async fn get_settings(State(state): State<ServerState>) -> AppResult<Json<SiteSettings>> {
    Ok(Json(setting::get_site(&state.pool).await?))
}

/// PUT /api/admin/settings - replaces the whole document
pub async fn update_settings(
    State(state): State<ServerState>,
    Json(mut payload): Json<SiteSettings>,
) -> AppResult<Json<SiteSettings>> {
    let mut seen = Vec::with_capacity(payload.payment_methods.len());
    payload.payment_methods.retain(|method| {
        let first = !seen.contains(method);
        seen.push(*method);
        first
    });
    validate_settings(&payload)?;
    setting::save_site(&state.pool, &payload).await?;
    tracing::info!(
        payment_methods = ?payload.payment_methods,
        shipping_fee = payload.shipping_fee,
        "Site settings updated"
    );
    Ok(Json(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{BankSettings, CryptoSettings, PaypalSettings};

    fn bank() -> BankSettings {
        BankSettings {
            bank_bin: "970436".into(),
            bank_name: "Vietcombank".into(),
            account_no: "0123456789".into(),
            account_name: "SHOP".into(),
            template: "compact2".into(),
        }
    }

    fn code(settings: &SiteSettings) -> ErrorCode {
        validate_settings(settings)
            .map(|_| ErrorCode::Success)
            .unwrap_or_else(|e| e.code)
    }

    #[test]
    fn test_method_needs_config() {
        // Defaults enable bank transfer without an account
        assert_eq!(code(&SiteSettings::default()), ErrorCode::SettingsInvalid);

        let configured = SiteSettings {
            bank: Some(bank()),
            ..Default::default()
        };
        assert_eq!(code(&configured), ErrorCode::Success);

        let paypal = SiteSettings {
            payment_methods: vec![PaymentMethod::Paypal],
            ..Default::default()
        };
        assert_eq!(code(&paypal), ErrorCode::SettingsInvalid);
    }

    #[test]
    fn test_amounts_and_rates() {
        let base = SiteSettings {
            payment_methods: vec![PaymentMethod::Cod],
            ..Default::default()
        };
        assert_eq!(code(&base), ErrorCode::Success);

        let negative_fee = SiteSettings {
            shipping_fee: -1.0,
            ..base.clone()
        };
        assert_eq!(code(&negative_fee), ErrorCode::SettingsInvalid);

        let zero_rate = SiteSettings {
            paypal: Some(PaypalSettings {
                currency: "USD".into(),
                exchange_rate: 0.0,
            }),
            ..base.clone()
        };
        assert_eq!(code(&zero_rate), ErrorCode::SettingsInvalid);

        let bad_wallet = SiteSettings {
            crypto: Some(CryptoSettings {
                wallet_address: "0x123".into(),
                chain_id: 1,
                fiat_per_token: 50_000_000.0,
                symbol: "ETH".into(),
                min_confirmations: 1,
            }),
            ..base
        };
        assert_eq!(code(&bad_wallet), ErrorCode::SettingsInvalid);
    }
}
