//! Cart pricing
//!
//! Turns requested items into priced lines and totals. Nothing here writes
//! to the database.

use rust_decimal::Decimal;
use shared::models::{CheckoutItem, Product, QuoteLine, SiteSettings};
use sqlx::SqlitePool;

use crate::db::repository::product;
use crate::utils::money::{line_total, to_decimal, to_f64};
use crate::vouchers::CartLine;
use crate::{AppError, AppResult, ErrorCode};

pub const MIN_QUANTITY: i64 = 1;
pub const MAX_QUANTITY: i64 = 999;

/// One cart line at current prices
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product: Product,
    pub quantity: i64,
    pub unit_price: f64,
    pub line_total: Decimal,
}

impl PricedLine {
    pub fn to_quote_line(&self) -> QuoteLine {
        QuoteLine {
            product_id: self.product.id,
            product_name: self.product.name.clone(),
            unit_price: self.unit_price,
            quantity: self.quantity,
            line_total: to_f64(self.line_total),
        }
    }
}

/// Money summary of a cart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

/// Merge repeated products and check quantities, keeping first-seen order.
pub fn merge_items(items: &[CheckoutItem]) -> AppResult<Vec<(i64, i64)>> {
    if items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }

    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(items.len());
    for item in items {
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&item.quantity) {
            return Err(invalid_quantity(item.product_id, item.quantity));
        }
        match merged.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, quantity)) => *quantity += item.quantity,
            None => merged.push((item.product_id, item.quantity)),
        }
    }

    if let Some((id, quantity)) = merged.iter().find(|(_, q)| *q > MAX_QUANTITY) {
        return Err(invalid_quantity(*id, *quantity));
    }
    Ok(merged)
}

fn invalid_quantity(product_id: i64, quantity: i64) -> AppError {
    AppError::with_message(
        ErrorCode::InvalidQuantity,
        format!("Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"),
    )
    .with_detail("product_id", product_id)
    .with_detail("quantity", quantity)
}

/// Load every product of the cart and price it.
///
/// Stock is only checked here as a hint; the checkout transaction takes
/// the units atomically.
pub async fn price_items(pool: &SqlitePool, items: &[CheckoutItem]) -> AppResult<Vec<PricedLine>> {
    let merged = merge_items(items)?;
    let mut lines = Vec::with_capacity(merged.len());

    for (product_id, quantity) in merged {
        let found = product::find_by_id(pool, product_id).await?.ok_or_else(|| {
            AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", product_id)
        })?;
        if !found.is_active {
            return Err(AppError::with_message(
                ErrorCode::ProductInactive,
                format!("{} is no longer available", found.name),
            )
            .with_detail("product_id", product_id));
        }
        if found.stock < quantity {
            return Err(out_of_stock(&found));
        }

        let unit_price = found.effective_price();
        lines.push(PricedLine {
            line_total: line_total(unit_price, quantity),
            unit_price,
            quantity,
            product: found,
        });
    }
    Ok(lines)
}

pub fn out_of_stock(product: &Product) -> AppError {
    AppError::with_message(
        ErrorCode::ProductOutOfStock,
        format!("{} is out of stock", product.name),
    )
    .with_detail("product_id", product.id)
    .with_detail("available", product.stock)
}

pub fn cart_lines(lines: &[PricedLine]) -> Vec<CartLine> {
    lines
        .iter()
        .map(|l| CartLine::new(l.product.id, l.line_total))
        .collect()
}

/// Flat fee, waived when the discounted subtotal reaches the threshold
pub fn shipping_fee(settings: &SiteSettings, discounted_subtotal: Decimal) -> Decimal {
    match settings.free_shipping_threshold {
        Some(threshold) if discounted_subtotal >= to_decimal(threshold) => Decimal::ZERO,
        _ => to_decimal(settings.shipping_fee).max(Decimal::ZERO),
    }
}

pub fn totals(lines: &[PricedLine], discount: Decimal, settings: &SiteSettings) -> Totals {
    let subtotal: Decimal = lines.iter().map(|l| l.line_total).sum();
    let discount = discount.clamp(Decimal::ZERO, subtotal);
    let shipping_fee = shipping_fee(settings, subtotal - discount);
    Totals {
        subtotal,
        discount,
        shipping_fee,
        total: subtotal - discount + shipping_fee,
    }
}
