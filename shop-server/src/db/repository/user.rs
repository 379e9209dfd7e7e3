//! User Repository

use super::{RepoError, RepoResult};
use shared::models::User;
use sqlx::SqlitePool;

const COLUMNS: &str =
    "id, email, password_hash, full_name, phone, role_id, is_active, created_at, updated_at";

/// New account row, password already hashed
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub phone: Option<&'a str>,
    pub role_id: Option<i64>,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM user WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Case-insensitive (the column is `COLLATE NOCASE`)
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM user WHERE email = ? LIMIT 1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM user")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn create(pool: &SqlitePool, data: NewUser<'_>) -> RepoResult<User> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();

    sqlx::query(
        "INSERT INTO user (id, email, password_hash, full_name, phone, role_id, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(data.email.trim())
    .bind(data.password_hash)
    .bind(data.full_name.trim())
    .bind(data.phone)
    .bind(data.role_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn find_page(pool: &SqlitePool, limit: u32, offset: u32) -> RepoResult<(Vec<User>, u64)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user")
        .fetch_one(pool)
        .await?;
    let sql = format!("SELECT {COLUMNS} FROM user ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
    let users = sqlx::query_as::<_, User>(&sql)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(pool)
        .await?;
    Ok((users, total.max(0) as u64))
}

/// Set role and active flag. `role_id: Some(None)` turns the account into a customer.
pub async fn update_access(
    pool: &SqlitePool,
    id: i64,
    role_id: Option<Option<i64>>,
    is_active: Option<bool>,
) -> RepoResult<User> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))?;

    let role_id = role_id.unwrap_or(existing.role_id);
    let is_active = is_active.unwrap_or(existing.is_active);

    sqlx::query("UPDATE user SET role_id = ?, is_active = ?, updated_at = ? WHERE id = ?")
        .bind(role_id)
        .bind(is_active)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(pool)
        .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}
