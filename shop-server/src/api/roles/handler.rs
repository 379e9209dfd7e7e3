//! Role Management Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Role, RoleCreate, RoleUpdate};

use crate::auth::CurrentUser;
use crate::auth::permissions::{ALL, ALL_PERMISSIONS, is_valid_permission};
use crate::core::ServerState;
use crate::db::repository::role;
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::{AppError, AppResult, ErrorCode};

fn validate_permissions(permissions: &[String]) -> AppResult<()> {
    if let Some(bad) = permissions.iter().find(|p| !is_valid_permission(p)) {
        return Err(
            AppError::validation(format!("Unknown permission: {bad}")).with_detail("permission", bad.as_str())
        );
    }
    Ok(())
}

/// Non-admins may only hand out permissions they already hold, never `all`
fn ensure_grantable(current: &CurrentUser, permissions: &[String]) -> AppResult<()> {
    if current.is_admin() {
        return Ok(());
    }
    if let Some(denied) = permissions
        .iter()
        .find(|p| p.as_str() == ALL || !current.has_permission(p))
    {
        security_log!(
            "WARN",
            "permission_escalation_denied",
            user_id = current.id,
            permission = denied.as_str()
        );
        return Err(AppError::permission_denied(format!(
            "Cannot grant permission '{denied}'"
        ))
        .with_detail("permission", denied.as_str()));
    }
    Ok(())
}

/// GET /api/admin/roles
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(role::find_all(&state.pool).await?))
}

/// GET /api/admin/roles/permissions - grantable permission strings
pub async fn all_permissions() -> Json<Vec<&'static str>> {
    Json(ALL_PERMISSIONS.to_vec())
}

/// GET /api/admin/roles/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Role>> {
    role::find_by_id(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound))
}

/// POST /api/admin/roles
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(mut payload): Json<RoleCreate>,
) -> AppResult<Json<Role>> {
    validate_required_text(&payload.name, "name", MAX_SHORT_TEXT_LEN)?;
    if let Some(display_name) = &payload.display_name {
        validate_required_text(display_name, "display_name", MAX_NAME_LEN)?;
    }
    validate_permissions(&payload.permissions)?;
    ensure_grantable(&current, &payload.permissions)?;
    payload.name = payload.name.trim().to_lowercase();

    let created = role::create(&state.pool, payload).await?;
    tracing::info!(role_id = created.id, name = %created.name, "Role created");
    Ok(Json(created))
}

/// PUT /api/admin/roles/{id} - system roles are read-only, and staff cannot edit their own role
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<Json<Role>> {
    if let Some(display_name) = &payload.display_name {
        validate_required_text(display_name, "display_name", MAX_NAME_LEN)?;
    }
    if let Some(permissions) = &payload.permissions {
        validate_permissions(permissions)?;
        ensure_grantable(&current, permissions)?;
    }
    if !current.is_admin()
        && let Some(existing) = role::find_by_id(&state.pool, id).await?
        && existing.name == current.role
    {
        return Err(AppError::permission_denied("You cannot change your own role"));
    }
    Ok(Json(role::update(&state.pool, id, payload).await?))
}

/// DELETE /api/admin/roles/{id} - refused for system roles and roles in use
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    let deleted = role::delete(&state.pool, id).await?;
    tracing::info!(role_id = id, "Role deleted");
    Ok(Json(deleted))
}
