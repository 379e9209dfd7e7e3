//! Permission Definitions
//!
//! Module-level permissions for the admin panel. Customers hold none; the
//! storefront only needs a logged-in user.

pub const CATALOG_MANAGE: &str = "catalog:manage";
pub const VOUCHERS_MANAGE: &str = "vouchers:manage";
pub const ORDERS_MANAGE: &str = "orders:manage";
pub const PAGES_MANAGE: &str = "pages:manage";
pub const SETTINGS_MANAGE: &str = "settings:manage";
pub const USERS_MANAGE: &str = "users:manage";
pub const ROLES_MANAGE: &str = "roles:manage";

/// Permissions that can be granted to a role
pub const ALL_PERMISSIONS: &[&str] = &[
    CATALOG_MANAGE,
    VOUCHERS_MANAGE,
    ORDERS_MANAGE,
    PAGES_MANAGE,
    SETTINGS_MANAGE,
    USERS_MANAGE,
    ROLES_MANAGE,
];

/// Super permission
pub const ALL: &str = "all";

/// Validate a permission string: a known permission, `all`, or a
/// `<module>:*` wildcard over a known module.
pub fn is_valid_permission(permission: &str) -> bool {
    if permission == ALL || ALL_PERMISSIONS.contains(&permission) {
        return true;
    }
    match permission.strip_suffix(":*") {
        Some(module) => ALL_PERMISSIONS
            .iter()
            .any(|p| p.split(':').next() == Some(module)),
        None => false,
    }
}
