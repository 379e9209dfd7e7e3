//! User Model

use serde::{Deserialize, Serialize};

/// User entity
///
/// Customers have no role; staff accounts point at a [`super::Role`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role_id: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// User as seen by clients, with the role resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub permissions: Vec<String>,
}

/// Admin-side user update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAdminUpdate {
    #[serde(default, deserialize_with = "super::category::double_option")]
    pub role_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
}
