//! Role Model

use serde::{Deserialize, Serialize};

/// Role entity (RBAC)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    /// JSON array of permission strings (e.g. ["all"], ["orders:manage", "catalog:*"])
    #[cfg_attr(feature = "db", sqlx(json))]
    pub permissions: Vec<String>,
    pub is_system: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub display_name: Option<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub display_name: Option<String>,
    pub permissions: Option<Vec<String>>,
}
