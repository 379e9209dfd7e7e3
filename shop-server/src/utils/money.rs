//! Money calculation utilities using rust_decimal for precision
//!
//! Amounts are stored and serialized as `f64`; all arithmetic goes through
//! `Decimal` and is rounded half-up to 2 places.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_default()
}

/// Round half-up to 2 decimal places
#[inline]
pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `unit × quantity`, rounded
pub fn line_total(unit_price: f64, quantity: i64) -> Decimal {
    round(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Format an amount with exactly 2 decimals, e.g. for provider APIs.
pub fn format_2dp(value: Decimal) -> String {
    format!("{:.2}", round(value))
}
