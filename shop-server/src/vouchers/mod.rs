//! Vouchers: eligibility checks, discount calculation and admin management

pub mod discount;
pub mod validator;

use rust_decimal::Decimal;
use shared::models::{
    DiscountType, PaymentMethod, PublicVoucher, Voucher, VoucherCheckRequest,
    VoucherCheckResponse, VoucherCreate, VoucherUpdate, VoucherWithStats,
};
use sqlx::SqlitePool;

pub use discount::Discount;
pub use validator::VoucherContext;

use crate::checkout::pricing;
use crate::db::repository::voucher;
use crate::utils::money::{to_decimal, to_f64};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_amount, validate_optional_text,
    validate_required_text,
};
use crate::{AppError, AppResult, ErrorCode};

/// A priced cart line as seen by voucher rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartLine {
    pub product_id: i64,
    pub line_total: Decimal,
}

impl CartLine {
    pub fn new(product_id: i64, line_total: Decimal) -> Self {
        Self {
            product_id,
            line_total,
        }
    }
}

/// Load a voucher by code, run every check and compute its discount.
pub async fn evaluate(
    pool: &SqlitePool,
    code: &str,
    user_id: i64,
    lines: &[CartLine],
    payment_method: Option<PaymentMethod>,
) -> AppResult<(Voucher, Discount)> {
    let found = voucher::find_by_code(pool, code).await?;
    let user_redemptions = match &found {
        Some(v) => voucher::count_user_redemptions(pool, v.id, user_id).await?,
        None => 0,
    };

    let ctx = VoucherContext {
        now: shared::util::now_millis(),
        user_redemptions,
        subtotal: lines.iter().map(|l| l.line_total).sum(),
        lines,
        payment_method,
    };
    let valid = validator::validate(found.as_ref(), &ctx)?;
    let discount = discount::compute(valid, lines);
    Ok((valid.clone(), discount))
}

/// Storefront voucher preview. Nothing is redeemed.
pub async fn check(
    pool: &SqlitePool,
    user_id: i64,
    req: VoucherCheckRequest,
) -> AppResult<VoucherCheckResponse> {
    validate_required_text(&req.code, "code", MAX_SHORT_TEXT_LEN)?;
    let priced = pricing::price_items(pool, &req.items).await?;
    let lines = pricing::cart_lines(&priced);
    let subtotal: Decimal = lines.iter().map(|l| l.line_total).sum();

    let (found, discount) = evaluate(pool, &req.code, user_id, &lines, req.payment_method).await?;
    Ok(VoucherCheckResponse {
        code: found.code,
        discount: to_f64(discount.discount),
        eligible_subtotal: to_f64(discount.eligible_subtotal),
        subtotal: to_f64(subtotal),
    })
}

pub async fn list_public(pool: &SqlitePool) -> AppResult<Vec<PublicVoucher>> {
    Ok(voucher::find_public(pool, shared::util::now_millis()).await?)
}

pub async fn list_admin(pool: &SqlitePool) -> AppResult<Vec<VoucherWithStats>> {
    Ok(voucher::find_all_with_stats(pool).await?)
}

pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Voucher> {
    voucher::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::VoucherNotFound))
}

/// Upper-case, trimmed. Letters, digits, `-` and `_` only.
pub fn normalize_code(code: &str) -> AppResult<String> {
    let code = code.trim().to_uppercase();
    validate_required_text(&code, "code", MAX_SHORT_TEXT_LEN)?;
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::validation(
            "code may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(code)
}

/// Field rules shared by create and update, checked on the merged voucher
fn check_rules(v: &Voucher) -> AppResult<()> {
    validate_required_text(&v.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&v.description, "description", MAX_NOTE_LEN)?;
    validate_amount(v.discount_value, "discount_value")?;
    validate_amount(v.min_order_value, "min_order_value")?;
    if let Some(cap) = v.max_discount {
        validate_amount(cap, "max_discount")?;
    }

    let value = to_decimal(v.discount_value);
    let in_range = match v.discount_type {
        DiscountType::Percentage => value > Decimal::ZERO && value <= Decimal::ONE_HUNDRED,
        DiscountType::FixedAmount => value > Decimal::ZERO,
    };
    if !in_range {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "discount_value must be in (0, 100] for percentages and positive for fixed amounts",
        ));
    }

    for (field, limit) in [("usage_limit", v.usage_limit), ("per_user_limit", v.per_user_limit)] {
        if let Some(n) = limit
            && n < 1
        {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("{field} must be at least 1"),
            ));
        }
    }
    if let Some(limit) = v.usage_limit
        && v.used_count > limit
    {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("usage_limit cannot be below the {} uses already taken", v.used_count),
        )
        .with_detail("used_count", v.used_count));
    }
    if let (Some(start), Some(end)) = (v.starts_at, v.ends_at)
        && start > end
    {
        return Err(AppError::validation("starts_at must not be after ends_at"));
    }
    Ok(())
}

pub async fn create(pool: &SqlitePool, data: VoucherCreate) -> AppResult<Voucher> {
    let code = normalize_code(&data.code)?;
    let now = shared::util::now_millis();
    let new = Voucher {
        id: shared::util::snowflake_id(),
        code,
        name: data.name.trim().to_string(),
        description: data.description,
        discount_type: data.discount_type,
        discount_value: data.discount_value,
        max_discount: data.max_discount,
        min_order_value: data.min_order_value.unwrap_or(0.0),
        usage_limit: data.usage_limit,
        used_count: 0,
        per_user_limit: data.per_user_limit,
        product_ids: data.product_ids,
        payment_methods: data.payment_methods,
        starts_at: data.starts_at,
        ends_at: data.ends_at,
        is_active: data.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };
    check_rules(&new)?;

    if voucher::code_exists(pool, &new.code).await? {
        return Err(AppError::with_message(
            ErrorCode::VoucherCodeExists,
            format!("Voucher code '{}' already exists", new.code),
        ));
    }

    let created = voucher::insert(pool, &new).await?;
    tracing::info!(voucher_id = created.id, code = %created.code, "Voucher created");
    Ok(created)
}

/// The code and usage counter are not editable
pub async fn update(pool: &SqlitePool, id: i64, data: VoucherUpdate) -> AppResult<Voucher> {
    let mut v = get(pool, id).await?;

    if let Some(name) = data.name {
        v.name = name.trim().to_string();
    }
    if let Some(description) = data.description {
        v.description = Some(description);
    }
    if let Some(discount_type) = data.discount_type {
        v.discount_type = discount_type;
    }
    if let Some(value) = data.discount_value {
        v.discount_value = value;
    }
    if let Some(cap) = data.max_discount {
        v.max_discount = cap;
    }
    if let Some(min) = data.min_order_value {
        v.min_order_value = min;
    }
    if let Some(limit) = data.usage_limit {
        v.usage_limit = limit;
    }
    if let Some(limit) = data.per_user_limit {
        v.per_user_limit = limit;
    }
    if let Some(ids) = data.product_ids {
        v.product_ids = ids;
    }
    if let Some(methods) = data.payment_methods {
        v.payment_methods = methods;
    }
    if let Some(starts_at) = data.starts_at {
        v.starts_at = starts_at;
    }
    if let Some(ends_at) = data.ends_at {
        v.ends_at = ends_at;
    }
    if let Some(is_active) = data.is_active {
        v.is_active = is_active;
    }
    check_rules(&v)?;

    v.updated_at = shared::util::now_millis();
    let saved = voucher::update_row(pool, &v).await?;
    tracing::info!(voucher_id = id, "Voucher updated");
    Ok(saved)
}

/// Soft delete: redemptions keep pointing at the row
pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    if !voucher::deactivate(pool, id).await? {
        return Err(AppError::new(ErrorCode::VoucherNotFound));
    }
    tracing::info!(voucher_id = id, "Voucher deactivated");
    Ok(())
}
