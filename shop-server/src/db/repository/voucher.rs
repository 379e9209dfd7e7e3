//! Voucher Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{PublicVoucher, Voucher, VoucherWithStats};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, code, name, description, discount_type, discount_value, max_discount, min_order_value, \
                       usage_limit, used_count, per_user_limit, product_ids, payment_methods, starts_at, ends_at, \
                       is_active, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Voucher>> {
    let sql = format!("SELECT {COLUMNS} FROM voucher WHERE id = ?");
    let voucher = sqlx::query_as::<_, Voucher>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(voucher)
}

/// Case-insensitive: codes are stored upper-cased
pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<Voucher>> {
    let sql = format!("SELECT {COLUMNS} FROM voucher WHERE code = ? LIMIT 1");
    let voucher = sqlx::query_as::<_, Voucher>(&sql)
        .bind(code.trim().to_uppercase())
        .fetch_optional(pool)
        .await?;
    Ok(voucher)
}

pub async fn code_exists(pool: &SqlitePool, code: &str) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM voucher WHERE code = ?")
        .bind(code)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Admin list, newest first, with redemption counts
pub async fn find_all_with_stats(pool: &SqlitePool) -> RepoResult<Vec<VoucherWithStats>> {
    let sql = format!("SELECT {COLUMNS} FROM voucher ORDER BY created_at DESC");
    let vouchers = sqlx::query_as::<_, Voucher>(&sql).fetch_all(pool).await?;

    let counts: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT voucher_id, COUNT(*) FROM voucher_redemption GROUP BY voucher_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(vouchers
        .into_iter()
        .map(|voucher| {
            let redemptions = counts
                .iter()
                .find(|(id, _)| *id == voucher.id)
                .map(|(_, n)| *n)
                .unwrap_or(0);
            VoucherWithStats {
                voucher,
                redemptions,
            }
        })
        .collect())
}

/// Active, currently valid vouchers with quota left
pub async fn find_public(pool: &SqlitePool, now: i64) -> RepoResult<Vec<PublicVoucher>> {
    let vouchers = sqlx::query_as::<_, PublicVoucher>(
        "SELECT code, name, description, discount_type, discount_value, max_discount, min_order_value, ends_at \
         FROM voucher \
         WHERE is_active = 1 \
           AND (starts_at IS NULL OR starts_at <= ?1) \
           AND (ends_at IS NULL OR ends_at >= ?1) \
           AND (usage_limit IS NULL OR used_count < usage_limit) \
         ORDER BY COALESCE(ends_at, 9223372036854775807), code",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(vouchers)
}

pub async fn count_user_redemptions(pool: &SqlitePool, voucher_id: i64, user_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM voucher_redemption WHERE voucher_id = ? AND user_id = ?",
    )
    .bind(voucher_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn insert(pool: &SqlitePool, voucher: &Voucher) -> RepoResult<Voucher> {
    let product_ids = serde_json::to_string(&voucher.product_ids)?;
    let payment_methods = serde_json::to_string(&voucher.payment_methods)?;
    sqlx::query(
        "INSERT INTO voucher (id, code, name, description, discount_type, discount_value, max_discount, min_order_value, \
         usage_limit, used_count, per_user_limit, product_ids, payment_methods, starts_at, ends_at, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(voucher.id)
    .bind(&voucher.code)
    .bind(&voucher.name)
    .bind(&voucher.description)
    .bind(voucher.discount_type)
    .bind(voucher.discount_value)
    .bind(voucher.max_discount)
    .bind(voucher.min_order_value)
    .bind(voucher.usage_limit)
    .bind(voucher.used_count)
    .bind(voucher.per_user_limit)
    .bind(product_ids)
    .bind(payment_methods)
    .bind(voucher.starts_at)
    .bind(voucher.ends_at)
    .bind(voucher.is_active)
    .bind(voucher.created_at)
    .bind(voucher.updated_at)
    .execute(pool)
    .await?;

    find_by_id(pool, voucher.id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create voucher".into()))
}

/// Write every editable column. `used_count` is only touched by redeem/release.
///
/// A new `usage_limit` must still cover the uses already taken at write time.
pub async fn update_row(pool: &SqlitePool, voucher: &Voucher) -> RepoResult<Voucher> {
    let product_ids = serde_json::to_string(&voucher.product_ids)?;
    let payment_methods = serde_json::to_string(&voucher.payment_methods)?;
    let rows = sqlx::query(
        "UPDATE voucher SET name = ?, description = ?, discount_type = ?, discount_value = ?, max_discount = ?, \
         min_order_value = ?, usage_limit = ?, per_user_limit = ?, product_ids = ?, payment_methods = ?, \
         starts_at = ?, ends_at = ?, is_active = ?, updated_at = ? \
         WHERE id = ? AND (? IS NULL OR used_count <= ?)",
    )
    .bind(&voucher.name)
    .bind(&voucher.description)
    .bind(voucher.discount_type)
    .bind(voucher.discount_value)
    .bind(voucher.max_discount)
    .bind(voucher.min_order_value)
    .bind(voucher.usage_limit)
    .bind(voucher.per_user_limit)
    .bind(product_ids)
    .bind(payment_methods)
    .bind(voucher.starts_at)
    .bind(voucher.ends_at)
    .bind(voucher.is_active)
    .bind(voucher.updated_at)
    .bind(voucher.id)
    .bind(voucher.usage_limit)
    .bind(voucher.usage_limit)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return match find_by_id(pool, voucher.id).await? {
            Some(current) => Err(RepoError::Business(
                ErrorCode::ValueOutOfRange,
                format!(
                    "usage_limit cannot be below the {} uses already taken",
                    current.used_count
                ),
            )),
            None => Err(RepoError::NotFound(format!("Voucher {} not found", voucher.id))),
        };
    }
    find_by_id(pool, voucher.id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Voucher {} not found", voucher.id)))
}

/// Soft delete
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE voucher SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Consume one use of the voucher for `order_id`.
///
/// The increment is conditional on both the global quota and the user's own
/// redemptions, so two concurrent checkouts cannot both take the last use.
pub async fn redeem(
    conn: &mut SqliteConnection,
    voucher_id: i64,
    user_id: i64,
    order_id: i64,
    now: i64,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE voucher SET used_count = used_count + 1, updated_at = ? \
         WHERE id = ? AND (usage_limit IS NULL OR used_count < usage_limit) \
         AND (per_user_limit IS NULL OR per_user_limit > \
              (SELECT COUNT(*) FROM voucher_redemption r WHERE r.voucher_id = voucher.id AND r.user_id = ?))",
    )
    .bind(now)
    .bind(voucher_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 0 {
        let exhausted: bool = sqlx::query_scalar(
            "SELECT usage_limit IS NOT NULL AND used_count >= usage_limit FROM voucher WHERE id = ?",
        )
        .bind(voucher_id)
        .fetch_optional(&mut *conn)
        .await?
        .unwrap_or(true);
        return Err(if exhausted {
            RepoError::Business(
                ErrorCode::VoucherUsageExhausted,
                "Voucher usage limit reached".into(),
            )
        } else {
            RepoError::Business(
                ErrorCode::VoucherUserLimitReached,
                "Voucher per-user limit reached".into(),
            )
        });
    }

    sqlx::query(
        "INSERT INTO voucher_redemption (id, voucher_id, user_id, order_id, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(shared::util::snowflake_id())
    .bind(voucher_id)
    .bind(user_id)
    .bind(order_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Give back the use taken by `order_id`. No-op when the order had none.
pub async fn release(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<bool> {
    let voucher_id: Option<i64> =
        sqlx::query_scalar("DELETE FROM voucher_redemption WHERE order_id = ? RETURNING voucher_id")
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(voucher_id) = voucher_id else {
        return Ok(false);
    };

    sqlx::query(
        "UPDATE voucher SET used_count = MAX(used_count - 1, 0), updated_at = ? WHERE id = ?",
    )
    .bind(shared::util::now_millis())
    .bind(voucher_id)
    .execute(&mut *conn)
    .await?;
    Ok(true)
}
