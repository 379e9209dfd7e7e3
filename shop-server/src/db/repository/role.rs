//! Role Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{Role, RoleCreate, RoleUpdate};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, display_name, permissions, is_system, created_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let sql = format!("SELECT {COLUMNS} FROM role ORDER BY id");
    let roles = sqlx::query_as::<_, Role>(&sql).fetch_all(pool).await?;
    Ok(roles)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Role>> {
    let sql = format!("SELECT {COLUMNS} FROM role WHERE id = ?");
    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(role)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Role>> {
    let sql = format!("SELECT {COLUMNS} FROM role WHERE name = ? LIMIT 1");
    let role = sqlx::query_as::<_, Role>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(role)
}

pub async fn create(pool: &SqlitePool, data: RoleCreate) -> RepoResult<Role> {
    if find_by_name(pool, &data.name).await?.is_some() {
        return Err(RepoError::Business(
            ErrorCode::RoleNameExists,
            format!("Role '{}' already exists", data.name),
        ));
    }

    let id = shared::util::snowflake_id();
    let display_name = data.display_name.unwrap_or_else(|| data.name.clone());
    let permissions_json = serde_json::to_string(&data.permissions)?;

    sqlx::query(
        "INSERT INTO role (id, name, display_name, permissions, is_system, created_at) VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(display_name)
    .bind(permissions_json)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create role".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: RoleUpdate) -> RepoResult<Role> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Business(ErrorCode::RoleNotFound, format!("Role {id} not found")))?;

    if existing.is_system {
        return Err(RepoError::Business(
            ErrorCode::SystemRoleProtected,
            "Cannot modify system role".into(),
        ));
    }

    let permissions_json = data
        .permissions
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        "UPDATE role SET display_name = COALESCE(?1, display_name), permissions = COALESCE(?2, permissions) WHERE id = ?3",
    )
    .bind(data.display_name)
    .bind(permissions_json)
    .bind(id)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Business(ErrorCode::RoleNotFound, format!("Role {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let existing = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Business(ErrorCode::RoleNotFound, format!("Role {id} not found")))?;

    if existing.is_system {
        return Err(RepoError::Business(
            ErrorCode::SystemRoleProtected,
            "Cannot delete system role".into(),
        ));
    }

    let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user WHERE role_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if in_use > 0 {
        return Err(RepoError::Business(
            ErrorCode::RoleInUse,
            format!("Role is assigned to {in_use} user(s)"),
        ));
    }

    sqlx::query("DELETE FROM role WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(true)
}
