//! User Management API (admin)

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::{permissions, require_permission};
use crate::core::ServerState;

/// Mounted under `/api/admin`
pub fn admin_router() -> Router<ServerState> {
    Router::new()
        .route("/users", get(handler::list))
        .route("/users/{id}", put(handler::update_access))
        .route_layer(middleware::from_fn(require_permission(permissions::USERS_MANAGE)))
}
