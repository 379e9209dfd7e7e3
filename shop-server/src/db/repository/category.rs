//! Category Repository

use super::{RepoError, RepoResult};
use shared::models::{Category, SortOrderUpdate};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, name, slug, description, image, parent_id, level, sort_order, is_active, created_at, updated_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let mut conn = pool.acquire().await?;
    load_all(&mut conn).await
}

/// Whole table on an open connection or transaction
pub async fn load_all(conn: &mut SqliteConnection) -> RepoResult<Vec<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM category ORDER BY level, sort_order, name");
    let categories = sqlx::query_as::<_, Category>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(categories)
}

/// Touch `id` as the first write of a transaction.
///
/// The transaction then holds SQLite's write lock, so the tree it reads
/// next cannot change under it. Returns the row as it stands, `None` when
/// it does not exist.
pub async fn lock_row(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Category>> {
    let sql = format!("UPDATE category SET updated_at = updated_at WHERE id = ? RETURNING {COLUMNS}");
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(category)
}

pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<Category>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM category WHERE is_active = 1 ORDER BY level, sort_order, name"
    );
    let categories = sqlx::query_as::<_, Category>(&sql).fetch_all(pool).await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM category WHERE id = ?");
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> RepoResult<Option<Category>> {
    let sql = format!("SELECT {COLUMNS} FROM category WHERE slug = ? LIMIT 1");
    let category = sqlx::query_as::<_, Category>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

/// Whether a category other than `exclude_id` owns `slug`
pub async fn slug_exists(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> RepoResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM category WHERE slug = ? AND id IS NOT ?")
            .bind(slug)
            .bind(exclude_id)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

pub async fn count_children(pool: &SqlitePool, id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM category WHERE parent_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Products referencing the category, soft-deleted ones included
pub async fn count_products(pool: &SqlitePool, id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE category_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn insert(conn: &mut SqliteConnection, category: &Category) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO category (id, name, slug, description, image, parent_id, level, sort_order, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(&category.image)
    .bind(category.parent_id)
    .bind(category.level)
    .bind(category.sort_order)
    .bind(category.is_active)
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Write every column of an existing row
pub async fn update_row(conn: &mut SqliteConnection, category: &Category) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE category SET name = ?, slug = ?, description = ?, image = ?, parent_id = ?, level = ?, \
         sort_order = ?, is_active = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(&category.image)
    .bind(category.parent_id)
    .bind(category.level)
    .bind(category.sort_order)
    .bind(category.is_active)
    .bind(category.updated_at)
    .bind(category.id)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Category {} not found",
            category.id
        )));
    }
    Ok(())
}

/// Add `delta` to the level of every descendant of `id` (not `id` itself)
pub async fn shift_descendant_levels(
    conn: &mut SqliteConnection,
    id: i64,
    delta: i32,
    now: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query(
        "WITH RECURSIVE sub(id) AS ( \
             SELECT id FROM category WHERE parent_id = ? \
             UNION ALL \
             SELECT c.id FROM category c JOIN sub ON c.parent_id = sub.id \
         ) \
         UPDATE category SET level = level + ?, updated_at = ? WHERE id IN (SELECT id FROM sub)",
    )
    .bind(id)
    .bind(delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected())
}

/// Apply many `sort_order` changes atomically
pub async fn update_sort_orders(pool: &SqlitePool, updates: &[SortOrderUpdate]) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;
    for update in updates {
        let rows = sqlx::query("UPDATE category SET sort_order = ?, updated_at = ? WHERE id = ?")
            .bind(update.sort_order)
            .bind(now)
            .bind(update.id)
            .execute(&mut *tx)
            .await?;
        if rows.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!(
                "Category {} not found",
                update.id
            )));
        }
    }
    tx.commit().await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM category WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
