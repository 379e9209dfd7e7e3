//! Voucher discount calculation
//!
//! Uses rust_decimal for precise calculations, amounts leave as f64.

use rust_decimal::prelude::*;
use shared::models::{DiscountType, Voucher};

use super::CartLine;
use crate::utils::money::{round, to_decimal};

/// Calculated discount for one voucher against one cart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discount {
    pub discount: Decimal,
    pub eligible_subtotal: Decimal,
}

/// Whether a line falls inside the voucher's product scope
pub fn in_scope(voucher: &Voucher, product_id: i64) -> bool {
    voucher.product_ids.is_empty() || voucher.product_ids.contains(&product_id)
}

/// Sum of in-scope line totals (every line when the voucher is unscoped)
pub fn eligible_subtotal(voucher: &Voucher, lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .filter(|line| in_scope(voucher, line.product_id))
        .map(|line| line.line_total)
        .sum()
}

/// Discount the voucher grants on `lines`.
///
/// Never negative and never more than the eligible subtotal.
pub fn compute(voucher: &Voucher, lines: &[CartLine]) -> Discount {
    let eligible = eligible_subtotal(voucher, lines);
    let value = to_decimal(voucher.discount_value);

    let raw = match voucher.discount_type {
        DiscountType::Percentage => {
            let amount = eligible * value / Decimal::ONE_HUNDRED;
            match voucher.max_discount {
                Some(cap) if cap > 0.0 => amount.min(to_decimal(cap)),
                _ => amount,
            }
        }
        DiscountType::FixedAmount => value,
    };

    Discount {
        discount: round(raw.clamp(Decimal::ZERO, eligible)),
        eligible_subtotal: eligible,
    }
}
