//! User Management Handlers

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Role, User, UserAdminUpdate, UserInfo};
use shared::{PageParams, PaginatedResponse};

use crate::auth::CurrentUser;
use crate::auth::permissions::ALL;
use crate::core::ServerState;
use crate::db::repository::{role, user};
use crate::security_log;
use crate::{AppError, AppResult, ErrorCode};

const ADMIN_ROLE: &str = "admin";

fn to_info(account: User, roles: &HashMap<i64, Role>) -> UserInfo {
    let found = account.role_id.and_then(|id| roles.get(&id));
    UserInfo {
        id: account.id,
        email: account.email,
        full_name: account.full_name,
        phone: account.phone,
        role: found.map(|r| r.name.clone()),
        permissions: found.map(|r| r.permissions.clone()).unwrap_or_default(),
    }
}

async fn role_map(state: &ServerState) -> AppResult<HashMap<i64, Role>> {
    Ok(role::find_all(&state.pool)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect())
}

/// GET /api/admin/users?page=&limit=
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<PaginatedResponse<UserInfo>>> {
    let (accounts, total) =
        user::find_page(&state.pool, params.limit(), params.offset() as u32).await?;
    let roles = role_map(&state).await?;
    let data = accounts.into_iter().map(|a| to_info(a, &roles)).collect();
    Ok(Json(PaginatedResponse::new(
        data,
        total,
        params.page(),
        params.limit(),
    )))
}

/// PUT /api/admin/users/{id} - role and active flag
///
/// Only admins may touch admin accounts or hand out an admin-level role
/// (the `admin` role or any role carrying `all`).
pub async fn update_access(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserAdminUpdate>,
) -> AppResult<Json<UserInfo>> {
    let target = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    if target.id == current.id {
        return Err(AppError::permission_denied("You cannot change your own access"));
    }

    let roles = role_map(&state).await?;
    let is_admin_role = |role_id: Option<i64>| {
        role_id
            .and_then(|rid| roles.get(&rid))
            .is_some_and(|r| r.name == ADMIN_ROLE || r.permissions.iter().any(|p| p == ALL))
    };

    if let Some(Some(role_id)) = payload.role_id
        && !roles.contains_key(&role_id)
    {
        return Err(AppError::new(ErrorCode::RoleNotFound).with_detail("role_id", role_id));
    }

    let grants_admin = payload.role_id.is_some_and(is_admin_role);
    if !current.is_admin() && (is_admin_role(target.role_id) || grants_admin) {
        security_log!(
            "WARN",
            "admin_modification_denied",
            user_id = current.id,
            target_id = target.id
        );
        return Err(AppError::new(ErrorCode::CannotModifyAdmin));
    }

    let updated = user::update_access(&state.pool, id, payload.role_id, payload.is_active).await?;
    tracing::info!(
        user_id = updated.id,
        role_id = ?updated.role_id,
        is_active = updated.is_active,
        staff_id = current.id,
        "User access updated"
    );
    Ok(Json(to_info(updated, &roles)))
}
