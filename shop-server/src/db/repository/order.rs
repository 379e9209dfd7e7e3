//! Order Repository

use super::{RepoError, RepoResult, contains_pattern};
use crate::utils::slug::fold_search;
use shared::models::{Order, OrderItem, OrderQuery, OrderStatus};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, order_code, user_id, status, payment_method, payment_status, subtotal, discount, \
                       shipping_fee, total, voucher_id, voucher_code, shipping_name, shipping_phone, \
                       shipping_address, note, paid_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, unit_price, quantity, line_total";

pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO shop_order (id, order_code, user_id, status, payment_method, payment_status, subtotal, discount, \
         shipping_fee, total, voucher_id, voucher_code, shipping_name, shipping_phone, shipping_address, note, \
         paid_at, search_text, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order.id)
    .bind(&order.order_code)
    .bind(order.user_id)
    .bind(order.status)
    .bind(order.payment_method)
    .bind(order.payment_status)
    .bind(order.subtotal)
    .bind(order.discount)
    .bind(order.shipping_fee)
    .bind(order.total)
    .bind(order.voucher_id)
    .bind(&order.voucher_code)
    .bind(&order.shipping_name)
    .bind(&order.shipping_phone)
    .bind(&order.shipping_address)
    .bind(&order.note)
    .bind(order.paid_at)
    .bind(fold_search(&format!(
        "{} {} {}",
        order.order_code, order.shipping_name, order.shipping_phone
    )))
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    for item in &order.items {
        sqlx::query(
            "INSERT INTO order_item (id, order_id, product_id, product_name, unit_price, quantity, line_total) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(item.line_total)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn find_items(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_item WHERE order_id = ? ORDER BY id");
    let items = sqlx::query_as::<_, OrderItem>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

/// Order with its items
pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("SELECT {COLUMNS} FROM shop_order WHERE id = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match order {
        Some(mut order) => {
            order.items = find_items(conn, order.id).await?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let mut conn = pool.acquire().await?;
    find_by_id(&mut conn, id).await
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, user_id: Option<i64>, query: &OrderQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(user_id) = user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(payment_status) = query.payment_status {
        qb.push(" AND payment_status = ").push_bind(payment_status);
    }
    if let Some(pattern) = query.q.as_deref().and_then(contains_pattern) {
        qb.push(" AND search_text LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'");
    }
}

/// Newest first, items not loaded. Restricted to `user_id` when given.
pub async fn search(
    pool: &SqlitePool,
    user_id: Option<i64>,
    query: &OrderQuery,
    limit: u32,
    offset: u32,
) -> RepoResult<(Vec<Order>, u64)> {
    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM shop_order");
    push_filters(&mut count_qb, user_id, query);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM shop_order"));
    push_filters(&mut qb, user_id, query);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit as i64)
        .push(" OFFSET ")
        .push_bind(offset as i64);

    let orders = qb.build_query_as::<Order>().fetch_all(pool).await?;
    Ok((orders, total.max(0) as u64))
}

/// Move to `next` only if the row is still in `current`.
///
/// With `require_unpaid` the row must also still be waiting for its money
/// (`UNPAID` or `FAILED`). Cancelling a paid order marks it `REFUNDED`.
pub async fn update_status(
    conn: &mut SqliteConnection,
    id: i64,
    current: OrderStatus,
    next: OrderStatus,
    require_unpaid: bool,
    now: i64,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE shop_order SET status = ?, \
         payment_status = CASE WHEN ? AND payment_status = 'PAID' THEN 'REFUNDED' ELSE payment_status END, \
         updated_at = ? \
         WHERE id = ? AND status = ? AND (? = 0 OR payment_status IN ('UNPAID', 'FAILED'))",
    )
    .bind(next)
    .bind(next == OrderStatus::Cancelled)
    .bind(now)
    .bind(id)
    .bind(current)
    .bind(require_unpaid)
    .execute(&mut *conn)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::Validation(format!(
            "Order {id} changed concurrently"
        )));
    }
    Ok(())
}

/// A payment attempt was rejected. Only an unpaid, open order is touched.
pub async fn mark_payment_failed(conn: &mut SqliteConnection, id: i64, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE shop_order SET payment_status = 'FAILED', updated_at = ? \
         WHERE id = ? AND payment_status = 'UNPAID' AND status != 'CANCELLED'",
    )
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Flag as paid. Returns `false` when it already was paid or is cancelled.
pub async fn mark_paid(conn: &mut SqliteConnection, id: i64, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE shop_order SET payment_status = 'PAID', paid_at = ?, updated_at = ? \
         WHERE id = ? AND payment_status != 'PAID' AND status != 'CANCELLED'",
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}
