//! Page Repository

use super::{RepoError, RepoResult};
use shared::models::{Page, PageSummary, PageUpdate};
use sqlx::SqlitePool;

const COLUMNS: &str =
    "id, title, slug, content, excerpt, is_published, sort_order, created_at, updated_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Page>> {
    let sql = format!("SELECT {COLUMNS} FROM page ORDER BY sort_order, title");
    let pages = sqlx::query_as::<_, Page>(&sql).fetch_all(pool).await?;
    Ok(pages)
}

pub async fn find_published(pool: &SqlitePool) -> RepoResult<Vec<PageSummary>> {
    let pages = sqlx::query_as::<_, PageSummary>(
        "SELECT id, title, slug, excerpt FROM page WHERE is_published = 1 ORDER BY sort_order, title",
    )
    .fetch_all(pool)
    .await?;
    Ok(pages)
}

pub async fn find_published_by_slug(pool: &SqlitePool, slug: &str) -> RepoResult<Option<Page>> {
    let sql = format!("SELECT {COLUMNS} FROM page WHERE slug = ? AND is_published = 1 LIMIT 1");
    let page = sqlx::query_as::<_, Page>(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(page)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Page>> {
    let sql = format!("SELECT {COLUMNS} FROM page WHERE id = ?");
    let page = sqlx::query_as::<_, Page>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(page)
}

pub async fn slug_exists(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM page WHERE slug = ? AND id IS NOT ?")
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn insert(pool: &SqlitePool, page: &Page) -> RepoResult<Page> {
    sqlx::query(
        "INSERT INTO page (id, title, slug, content, excerpt, is_published, sort_order, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(page.id)
    .bind(&page.title)
    .bind(&page.slug)
    .bind(&page.content)
    .bind(&page.excerpt)
    .bind(page.is_published)
    .bind(page.sort_order)
    .bind(page.created_at)
    .bind(page.updated_at)
    .execute(pool)
    .await?;

    find_by_id(pool, page.id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create page".into()))
}

/// `slug` is the already de-duplicated slug, if it changes
pub async fn update(pool: &SqlitePool, id: i64, data: PageUpdate, slug: Option<String>) -> RepoResult<Page> {
    let rows = sqlx::query(
        "UPDATE page SET title = COALESCE(?1, title), slug = COALESCE(?2, slug), content = COALESCE(?3, content), \
         excerpt = COALESCE(?4, excerpt), is_published = COALESCE(?5, is_published), \
         sort_order = COALESCE(?6, sort_order), updated_at = ?7 WHERE id = ?8",
    )
    .bind(data.title)
    .bind(slug)
    .bind(data.content)
    .bind(data.excerpt)
    .bind(data.is_published)
    .bind(data.sort_order)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Page {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Page {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM page WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
