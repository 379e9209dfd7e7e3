//! Order settlement
//!
//! Binds provider results to shop orders. Every successful path records a
//! `payment` row and flips the order to `PAID` in one transaction.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::models::{
    BankTransferInstructions, CryptoInstructions, CryptoSettings, Order, OrderStatus, Payment,
    PaymentInstructions, PaymentMethod, PaymentRecordStatus, PaymentStatus, PaypalCheckout,
    SiteSettings,
};
use sqlx::SqlitePool;

use super::PaymentError;
use super::evm::{self, ChainRpc, ExpectedTransfer};
use super::paypal::{self, PaypalClient};
use super::vietqr;
use crate::checkout;
use crate::db::repository::{RepoError, order, payment, setting};
use crate::utils::money::{format_2dp, to_decimal, to_f64};
use crate::{AppError, AppResult, ErrorCode};

const WEI_DECIMALS: u32 = 18;

/// Payment step shown right after checkout
///
/// Bank transfer and crypto orders get their instructions; the other
/// methods have no upfront step.
pub fn instructions_for(settings: &SiteSettings, placed: &Order) -> Option<PaymentInstructions> {
    match placed.payment_method {
        PaymentMethod::BankTransfer => settings
            .bank
            .as_ref()
            .map(|bank| PaymentInstructions::BankTransfer(vietqr::instructions(bank, placed))),
        PaymentMethod::Crypto => {
            let crypto = settings.crypto.as_ref()?;
            match crypto_instructions(crypto, placed) {
                Ok(instructions) => Some(PaymentInstructions::Crypto(instructions)),
                Err(e) => {
                    tracing::warn!(order_id = placed.id, error = %e, "No crypto instructions");
                    None
                }
            }
        }
        PaymentMethod::Cod | PaymentMethod::Paypal => None,
    }
}

pub fn crypto_instructions(
    crypto: &CryptoSettings,
    placed: &Order,
) -> Result<CryptoInstructions, PaymentError> {
    let wei = evm::expected_wei(placed.total, crypto.fiat_per_token)?;
    Ok(CryptoInstructions {
        order_code: placed.order_code.clone(),
        wallet_address: crypto.wallet_address.clone(),
        chain_id: crypto.chain_id,
        symbol: crypto.symbol.clone(),
        amount_wei: wei.to_string(),
        amount_hex: format!("0x{wei:x}"),
    })
}

/// The customer's order, still waiting for a payment by `method`
pub async fn load_payable_order(
    pool: &SqlitePool,
    user_id: i64,
    order_id: i64,
    method: PaymentMethod,
) -> AppResult<Order> {
    let found = checkout::get_for_user(pool, user_id, order_id).await?;
    ensure_payable(&found)?;
    if found.payment_method != method {
        return Err(AppError::new(ErrorCode::PaymentMethodMismatch)
            .with_detail("order_method", found.payment_method.as_str())
            .with_detail("requested_method", method.as_str()));
    }
    Ok(found)
}

fn ensure_payable(found: &Order) -> AppResult<()> {
    if found.payment_status == PaymentStatus::Paid {
        return Err(AppError::new(ErrorCode::OrderAlreadyPaid));
    }
    if found.status == OrderStatus::Cancelled {
        return Err(AppError::new(ErrorCode::OrderCancelled));
    }
    Ok(())
}

/// Record a completed payment and mark the order paid, atomically
async fn settle(pool: &SqlitePool, record: Payment) -> AppResult<Order> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    payment::insert(&mut *tx, &record).await.map_err(map_duplicate_ref)?;
    if !order::mark_paid(&mut *tx, record.order_id, now).await? {
        return Err(AppError::new(ErrorCode::OrderAlreadyPaid));
    }
    let paid = order::find_by_id(&mut *tx, record.order_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        order_id = paid.id,
        order_code = %paid.order_code,
        method = record.method.as_str(),
        provider_ref = ?record.provider_ref,
        "Order paid"
    );
    Ok(paid)
}

/// A second insert of the same provider reference loses the race
fn map_duplicate_ref(err: RepoError) -> AppError {
    match err {
        RepoError::Duplicate(_) => AppError::new(ErrorCode::PaymentAlreadyProcessed),
        other => other.into(),
    }
}

// =============================================================================
// Bank transfer
// =============================================================================

pub async fn bank_transfer(
    pool: &SqlitePool,
    user_id: i64,
    order_id: i64,
) -> AppResult<BankTransferInstructions> {
    let found = load_payable_order(pool, user_id, order_id, PaymentMethod::BankTransfer).await?;
    let settings = setting::get_site(pool).await?;
    let bank = settings
        .bank
        .as_ref()
        .ok_or(PaymentError::NotConfigured("bank account"))?;
    Ok(vietqr::instructions(bank, &found))
}

// =============================================================================
// PayPal
// =============================================================================

/// Create (or reuse) the PayPal order for a shop order
pub async fn paypal_create(
    pool: &SqlitePool,
    client: &PaypalClient,
    user_id: i64,
    order_id: i64,
) -> AppResult<PaypalCheckout> {
    let found = load_payable_order(pool, user_id, order_id, PaymentMethod::Paypal).await?;
    let settings = setting::get_site(pool).await?;
    let paypal_settings = settings
        .paypal
        .as_ref()
        .ok_or(PaymentError::NotConfigured("paypal exchange rate"))?;

    let amount = paypal::convert_amount(found.total, paypal_settings.exchange_rate)?;
    let amount_str = format_2dp(amount);
    let created = client
        .create_order(&found.order_code, &paypal_settings.currency, &amount_str)
        .await?;

    // PayPal hands back the same order for a repeated request id
    if payment::find_by_provider_ref(pool, &created.id).await?.is_none() {
        let now = shared::util::now_millis();
        let record = Payment {
            id: shared::util::snowflake_id(),
            order_id: found.id,
            method: PaymentMethod::Paypal,
            provider_ref: Some(created.id.clone()),
            amount: to_f64(amount),
            currency: paypal_settings.currency.clone(),
            status: PaymentRecordStatus::Pending,
            raw: None,
            created_at: now,
            updated_at: now,
        };
        let mut conn = pool.acquire().await.map_err(RepoError::from)?;
        payment::insert(&mut *conn, &record).await?;
    }

    tracing::info!(
        order_id = found.id,
        paypal_order_id = %created.id,
        amount = %amount_str,
        "PayPal order created"
    );
    Ok(PaypalCheckout {
        approve_url: created.approve_url(),
        paypal_order_id: created.id,
        amount: amount_str,
        currency: paypal_settings.currency.clone(),
    })
}

/// Capture the approved PayPal order and settle the shop order
pub async fn paypal_capture(
    pool: &SqlitePool,
    client: &PaypalClient,
    user_id: i64,
    order_id: i64,
) -> AppResult<Order> {
    let found = load_payable_order(pool, user_id, order_id, PaymentMethod::Paypal).await?;
    let pending = payment::find_pending(pool, found.id, PaymentMethod::Paypal)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::PaymentVerificationFailed,
                "No PayPal order was created for this order",
            )
        })?;
    let paypal_order_id = pending
        .provider_ref
        .clone()
        .ok_or_else(|| AppError::internal("Pending PayPal payment without reference"))?;

    let (captured, raw) = client.capture_order(&paypal_order_id).await?;
    let expected = crate::utils::money::round(to_decimal(pending.amount));
    let now = shared::util::now_millis();

    if let Err(e) = paypal::verify_capture(&captured, &found.order_code, expected, &pending.currency) {
        let mut tx = pool.begin().await.map_err(RepoError::from)?;
        payment::update_status(&mut *tx, pending.id, PaymentRecordStatus::Failed, Some(&raw), now)
            .await?;
        order::mark_payment_failed(&mut *tx, found.id, now).await?;
        tx.commit().await.map_err(RepoError::from)?;
        tracing::warn!(order_id = found.id, paypal_order_id = %paypal_order_id, error = %e, "PayPal capture rejected");
        return Err(e.into());
    }

    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    payment::update_status(&mut *tx, pending.id, PaymentRecordStatus::Completed, Some(&raw), now)
        .await?;
    if !order::mark_paid(&mut *tx, found.id, now).await? {
        return Err(AppError::new(ErrorCode::OrderAlreadyPaid));
    }
    let paid = order::find_by_id(&mut *tx, found.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        order_id = paid.id,
        paypal_order_id = %paypal_order_id,
        "PayPal payment captured"
    );
    Ok(paid)
}

// =============================================================================
// Crypto (EVM)
// =============================================================================

async fn crypto_settings(pool: &SqlitePool) -> AppResult<CryptoSettings> {
    let settings = setting::get_site(pool).await?;
    Ok(settings
        .crypto
        .ok_or(PaymentError::NotConfigured("crypto wallet"))?)
}

pub async fn crypto_details(
    pool: &SqlitePool,
    user_id: i64,
    order_id: i64,
) -> AppResult<CryptoInstructions> {
    let found = load_payable_order(pool, user_id, order_id, PaymentMethod::Crypto).await?;
    let crypto = crypto_settings(pool).await?;
    Ok(crypto_instructions(&crypto, &found)?)
}

/// Check a wallet transfer on chain and settle the order with it
pub async fn crypto_verify(
    pool: &SqlitePool,
    chain: &dyn ChainRpc,
    user_id: i64,
    order_id: i64,
    tx_hash: &str,
) -> AppResult<Order> {
    let tx_hash = evm::normalize_tx_hash(tx_hash)?;
    let found = load_payable_order(pool, user_id, order_id, PaymentMethod::Crypto).await?;

    if payment::find_by_provider_ref(pool, &tx_hash).await?.is_some() {
        crate::security_log!("WARN", "tx_hash_reuse", order_id = order_id, tx_hash = tx_hash.as_str());
        return Err(AppError::new(ErrorCode::PaymentAlreadyProcessed));
    }

    let crypto = crypto_settings(pool).await?;
    let expected = ExpectedTransfer {
        wallet_address: &crypto.wallet_address,
        chain_id: crypto.chain_id,
        amount_wei: evm::expected_wei(found.total, crypto.fiat_per_token)?,
        min_confirmations: crypto.min_confirmations,
    };
    let verified = evm::verify_transfer(chain, &tx_hash, &expected).await?;

    let tokens = i128::try_from(verified.value_wei)
        .ok()
        .and_then(|wei| Decimal::try_from_i128_with_scale(wei, WEI_DECIMALS).ok())
        .unwrap_or_default();
    let now = shared::util::now_millis();
    let record = Payment {
        id: shared::util::snowflake_id(),
        order_id: found.id,
        method: PaymentMethod::Crypto,
        provider_ref: Some(verified.tx_hash.clone()),
        amount: tokens.to_f64().unwrap_or_default(),
        currency: crypto.symbol.clone(),
        status: PaymentRecordStatus::Completed,
        raw: Some(
            serde_json::json!({
                "from": verified.from,
                "value_wei": verified.value_wei.to_string(),
                "chain_id": crypto.chain_id,
            })
            .to_string(),
        ),
        created_at: now,
        updated_at: now,
    };
    settle(pool, record).await
}

// =============================================================================
// Manual confirmation
// =============================================================================

/// Staff confirmation for cash on delivery and bank transfers
pub async fn mark_paid(pool: &SqlitePool, order_id: i64) -> AppResult<Order> {
    let found = checkout::get(pool, order_id).await?;
    ensure_payable(&found)?;

    let settings = setting::get_site(pool).await?;
    let now = shared::util::now_millis();
    let record = Payment {
        id: shared::util::snowflake_id(),
        order_id: found.id,
        method: found.payment_method,
        provider_ref: None,
        amount: found.total,
        currency: settings.currency,
        status: PaymentRecordStatus::Completed,
        raw: None,
        created_at: now,
        updated_at: now,
    };
    settle(pool, record).await
}

pub async fn history(pool: &SqlitePool, order_id: i64) -> AppResult<Vec<Payment>> {
    checkout::get(pool, order_id).await?;
    Ok(payment::find_by_order(pool, order_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(total: f64) -> Order {
        Order {
            id: 1,
            order_code: "DH240101ABCDEF".into(),
            user_id: 1,
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Crypto,
            payment_status: PaymentStatus::Unpaid,
            subtotal: total,
            discount: 0.0,
            shipping_fee: 0.0,
            total,
            voucher_id: None,
            voucher_code: None,
            shipping_name: "A".into(),
            shipping_phone: "0".into(),
            shipping_address: "B".into(),
            note: None,
            paid_at: None,
            created_at: 0,
            updated_at: 0,
            items: vec![],
        }
    }

    fn crypto() -> CryptoSettings {
        CryptoSettings {
            wallet_address: "0xabc".into(),
            chain_id: 1,
            fiat_per_token: 50_000_000.0,
            symbol: "ETH".into(),
            min_confirmations: 0,
        }
    }

    #[test]
    fn test_crypto_instructions() {
        // 1,000,000 / 50,000,000 = 0.02 ETH
        let i = crypto_instructions(&crypto(), &placed(1_000_000.0)).unwrap();
        assert_eq!(i.amount_wei, "20000000000000000");
        assert_eq!(i.amount_hex, "0x470de4df820000");
    }

    #[test]
    fn test_instructions_only_for_bank_and_crypto() {
        let settings = SiteSettings {
            crypto: Some(crypto()),
            ..Default::default()
        };
        assert!(matches!(
            instructions_for(&settings, &placed(10.0)),
            Some(PaymentInstructions::Crypto(_))
        ));

        let mut cod = placed(10.0);
        cod.payment_method = PaymentMethod::Cod;
        assert!(instructions_for(&settings, &cod).is_none());

        // Bank transfer without a configured account
        cod.payment_method = PaymentMethod::BankTransfer;
        assert!(instructions_for(&settings, &cod).is_none());
    }

    #[test]
    fn test_ensure_payable() {
        let mut o = placed(1.0);
        assert!(ensure_payable(&o).is_ok());
        o.status = OrderStatus::Cancelled;
        assert_eq!(ensure_payable(&o).unwrap_err().code, ErrorCode::OrderCancelled);
        o.payment_status = PaymentStatus::Paid;
        assert_eq!(ensure_payable(&o).unwrap_err().code, ErrorCode::OrderAlreadyPaid);
    }
}
