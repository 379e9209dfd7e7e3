//! Payment Repository

use super::RepoResult;
use shared::models::{Payment, PaymentMethod, PaymentRecordStatus};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str =
    "id, order_id, method, provider_ref, amount, currency, status, raw, created_at, updated_at";

pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO payment (id, order_id, method, provider_ref, amount, currency, status, raw, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(payment.id)
    .bind(payment.order_id)
    .bind(payment.method)
    .bind(&payment.provider_ref)
    .bind(payment.amount)
    .bind(&payment.currency)
    .bind(payment.status)
    .bind(&payment.raw)
    .bind(payment.created_at)
    .bind(payment.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn find_by_provider_ref(pool: &SqlitePool, provider_ref: &str) -> RepoResult<Option<Payment>> {
    let sql = format!("SELECT {COLUMNS} FROM payment WHERE provider_ref = ? LIMIT 1");
    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(provider_ref)
        .fetch_optional(pool)
        .await?;
    Ok(payment)
}

/// Latest pending payment of `method` for an order
pub async fn find_pending(
    pool: &SqlitePool,
    order_id: i64,
    method: PaymentMethod,
) -> RepoResult<Option<Payment>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM payment WHERE order_id = ? AND method = ? AND status = 'PENDING' \
         ORDER BY created_at DESC LIMIT 1"
    );
    let payment = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .bind(method)
        .fetch_optional(pool)
        .await?;
    Ok(payment)
}

pub async fn find_by_order(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<Payment>> {
    let sql = format!("SELECT {COLUMNS} FROM payment WHERE order_id = ? ORDER BY created_at");
    let payments = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(payments)
}

pub async fn update_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: PaymentRecordStatus,
    raw: Option<&str>,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE payment SET status = ?, raw = COALESCE(?, raw), updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(raw)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
