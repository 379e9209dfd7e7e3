//! Voucher eligibility
//!
//! Checks run in a fixed order and the first failure wins, so a customer
//! always sees the same reason for the same voucher and cart.

use rust_decimal::Decimal;
use shared::models::{PaymentMethod, Voucher};

use super::CartLine;
use super::discount::in_scope;
use crate::utils::money::{format_2dp, to_decimal};
use crate::{AppError, AppResult, ErrorCode};

/// Everything the checks need besides the voucher itself
#[derive(Debug, Clone)]
pub struct VoucherContext<'a> {
    /// Unix millis
    pub now: i64,
    /// Redemptions of this voucher by the current customer
    pub user_redemptions: i64,
    pub subtotal: Decimal,
    pub lines: &'a [CartLine],
    pub payment_method: Option<PaymentMethod>,
}

pub fn validate<'v>(voucher: Option<&'v Voucher>, ctx: &VoucherContext<'_>) -> AppResult<&'v Voucher> {
    let voucher = voucher.ok_or_else(|| AppError::new(ErrorCode::VoucherNotFound))?;

    if !voucher.is_active {
        return Err(AppError::new(ErrorCode::VoucherInactive));
    }
    if let Some(starts_at) = voucher.starts_at
        && ctx.now < starts_at
    {
        return Err(AppError::new(ErrorCode::VoucherNotStarted).with_detail("starts_at", starts_at));
    }
    if let Some(ends_at) = voucher.ends_at
        && ctx.now > ends_at
    {
        return Err(AppError::new(ErrorCode::VoucherExpired).with_detail("ends_at", ends_at));
    }
    if let Some(limit) = voucher.usage_limit
        && voucher.used_count >= limit
    {
        return Err(AppError::new(ErrorCode::VoucherUsageExhausted));
    }
    if let Some(limit) = voucher.per_user_limit
        && ctx.user_redemptions >= limit
    {
        return Err(AppError::new(ErrorCode::VoucherUserLimitReached).with_detail("per_user_limit", limit));
    }

    let minimum = to_decimal(voucher.min_order_value);
    if ctx.subtotal < minimum {
        return Err(AppError::with_message(
            ErrorCode::VoucherMinOrderNotMet,
            format!("Order total must be at least {}", format_2dp(minimum)),
        )
        .with_detail("min_order_value", voucher.min_order_value));
    }

    if !voucher.product_ids.is_empty()
        && !ctx.lines.iter().any(|line| in_scope(voucher, line.product_id))
    {
        return Err(AppError::new(ErrorCode::VoucherProductNotApplicable));
    }

    if let Some(method) = ctx.payment_method
        && !voucher.payment_methods.is_empty()
        && !voucher.payment_methods.contains(&method)
    {
        return Err(AppError::new(ErrorCode::VoucherPaymentMethodNotAllowed)
            .with_detail("payment_method", method.as_str()));
    }

    Ok(voucher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vouchers::tests::voucher;
    use shared::models::DiscountType;

    const NOW: i64 = 1_700_000_000_000;

    fn ctx(lines: &[CartLine]) -> VoucherContext<'_> {
        VoucherContext {
            now: NOW,
            user_redemptions: 0,
            subtotal: lines.iter().map(|l| l.line_total).sum(),
            lines,
            payment_method: Some(PaymentMethod::Cod),
        }
    }

    fn code_of(result: AppResult<&Voucher>) -> ErrorCode {
        result.map(|_| ErrorCode::Success).unwrap_or_else(|e| e.code)
    }

    #[test]
    fn test_each_check() {
        let lines = [CartLine::new(1, Decimal::from(100_000))];
        let base = voucher("OK", DiscountType::Percentage, 10.0);
        assert_eq!(code_of(validate(Some(&base), &ctx(&lines))), ErrorCode::Success);
        assert_eq!(code_of(validate(None, &ctx(&lines))), ErrorCode::VoucherNotFound);

        let cases: Vec<(Box<dyn Fn(&mut Voucher)>, ErrorCode)> = vec![
            (Box::new(|v: &mut Voucher| v.is_active = false), ErrorCode::VoucherInactive),
            (Box::new(|v: &mut Voucher| v.starts_at = Some(NOW + 1)), ErrorCode::VoucherNotStarted),
            (Box::new(|v: &mut Voucher| v.ends_at = Some(NOW - 1)), ErrorCode::VoucherExpired),
            (
                Box::new(|v: &mut Voucher| {
                    v.usage_limit = Some(3);
                    v.used_count = 3;
                }),
                ErrorCode::VoucherUsageExhausted,
            ),
            (Box::new(|v: &mut Voucher| v.per_user_limit = Some(0)), ErrorCode::VoucherUserLimitReached),
            (Box::new(|v: &mut Voucher| v.min_order_value = 100_001.0), ErrorCode::VoucherMinOrderNotMet),
            (Box::new(|v: &mut Voucher| v.product_ids = vec![7]), ErrorCode::VoucherProductNotApplicable),
            (
                Box::new(|v: &mut Voucher| v.payment_methods = vec![PaymentMethod::Paypal]),
                ErrorCode::VoucherPaymentMethodNotAllowed,
            ),
        ];
        for (mutate, expected) in cases {
            let mut v = base.clone();
            mutate(&mut v);
            assert_eq!(code_of(validate(Some(&v), &ctx(&lines))), expected);
        }
    }

    #[test]
    fn test_first_failure_wins() {
        let lines = [CartLine::new(1, Decimal::from(100))];
        let mut v = voucher("MANY", DiscountType::FixedAmount, 10.0);
        v.ends_at = Some(NOW - 1);
        v.min_order_value = 1_000_000.0;
        v.product_ids = vec![9];
        assert_eq!(code_of(validate(Some(&v), &ctx(&lines))), ErrorCode::VoucherExpired);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let lines = [CartLine::new(1, Decimal::from(50_000))];
        let mut v = voucher("EDGE", DiscountType::FixedAmount, 10.0);
        v.starts_at = Some(NOW);
        v.ends_at = Some(NOW);
        v.min_order_value = 50_000.0;
        assert!(validate(Some(&v), &ctx(&lines)).is_ok());
    }

    #[test]
    fn test_min_order_details_carry_minimum() {
        let lines = [CartLine::new(1, Decimal::from(10))];
        let mut v = voucher("MIN", DiscountType::FixedAmount, 5.0);
        v.min_order_value = 200_000.0;
        let err = validate(Some(&v), &ctx(&lines)).unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details["min_order_value"], serde_json::json!(200_000.0));
    }

    #[test]
    fn test_unknown_payment_method_skips_scope() {
        let lines = [CartLine::new(1, Decimal::from(10))];
        let mut v = voucher("PP", DiscountType::FixedAmount, 5.0);
        v.payment_methods = vec![PaymentMethod::Paypal];
        let mut context = ctx(&lines);
        context.payment_method = None;
        assert!(validate(Some(&v), &context).is_ok());
    }
}
