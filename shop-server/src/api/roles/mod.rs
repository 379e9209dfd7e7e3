//! Role Management API (admin)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::{permissions, require_permission};
use crate::core::ServerState;

/// Mounted under `/api/admin`
pub fn admin_router() -> Router<ServerState> {
    Router::new()
        .nest("/roles", admin_routes())
        .route_layer(middleware::from_fn(require_permission(permissions::ROLES_MANAGE)))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/permissions", get(handler::all_permissions))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
