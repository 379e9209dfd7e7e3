//! Authentication Handlers
//!
//! Customer registration, login for customers and staff, current user.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::models::{User, UserInfo};
use validator::Validate;

use crate::auth::{CUSTOMER_ROLE, CurrentUser, hash_password, verify_password};
use crate::core::ServerState;
use crate::db::repository::{role, user};
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, validate_dto};
use crate::{AppError, AppResult, ErrorCode};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Role name and permissions of an account, customers have none
async fn resolve_access(state: &ServerState, account: &User) -> AppResult<(Option<String>, Vec<String>)> {
    let Some(role_id) = account.role_id else {
        return Ok((None, vec![]));
    };
    let found = role::find_by_id(&state.pool, role_id)
        .await?
        .ok_or_else(|| AppError::internal(format!("User {} has a missing role {role_id}", account.id)))?;
    Ok((Some(found.name), found.permissions))
}

fn user_info(account: &User, role: Option<String>, permissions: Vec<String>) -> UserInfo {
    UserInfo {
        id: account.id,
        email: account.email.clone(),
        full_name: account.full_name.clone(),
        phone: account.phone.clone(),
        role,
        permissions,
    }
}

fn issue_token(state: &ServerState, account: &User, info: UserInfo) -> AppResult<LoginResponse> {
    let role_name = info.role.as_deref().unwrap_or(CUSTOMER_ROLE);
    let token = state
        .jwt_service
        .generate_token(account.id, &account.email, role_name, &info.permissions)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;
    Ok(LoginResponse {
        token,
        expires_in: state.jwt_service.expires_in_seconds(),
        user: info,
    })
}

/// POST /api/auth/register - create a customer account and log it in
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_dto(&req)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort).with_detail("min_length", MIN_PASSWORD_LEN));
    }
    let full_name = req.full_name.trim();
    if full_name.is_empty() || full_name.len() > MAX_NAME_LEN {
        return Err(AppError::validation("full_name must not be empty"));
    }

    let email = req.email.trim().to_lowercase();
    if user::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailExists));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
    let phone = req.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());
    let account = user::create(
        &state.pool,
        user::NewUser {
            email: &email,
            password_hash: &password_hash,
            full_name,
            phone,
            role_id: None,
        },
    )
    .await
    .map_err(|e| match e {
        // Lost a race with a concurrent registration
        crate::db::repository::RepoError::Duplicate(_) => AppError::new(ErrorCode::EmailExists),
        other => other.into(),
    })?;

    tracing::info!(user_id = account.id, email = %account.email, "Customer registered");
    let info = user_info(&account, None, vec![]);
    Ok(Json(issue_token(&state, &account, info)?))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    validate_dto(&req)?;
    let email = req.email.trim().to_lowercase();

    // Same error for unknown email and wrong password
    let account = match user::find_by_email(&state.pool, &email).await? {
        Some(account) if verify_password(&req.password, &account.password_hash) => account,
        _ => {
            security_log!("WARN", "login_failed", email = email.as_str());
            return Err(AppError::invalid_credentials());
        }
    };

    if !account.is_active {
        security_log!("WARN", "login_disabled", user_id = account.id);
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let (role, permissions) = resolve_access(&state, &account).await?;
    tracing::info!(
        user_id = account.id,
        role = role.as_deref().unwrap_or(CUSTOMER_ROLE),
        "User logged in"
    );
    let info = user_info(&account, role, permissions);
    Ok(Json(issue_token(&state, &account, info)?))
}

/// GET /api/auth/me - fresh profile, role and permissions
pub async fn me(State(state): State<ServerState>, current: CurrentUser) -> AppResult<Json<UserInfo>> {
    let account = user::find_by_id(&state.pool, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    if !account.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }
    let (role, permissions) = resolve_access(&state, &account).await?;
    Ok(Json(user_info(&account, role, permissions)))
}
