//! Content Page API

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::{permissions, require_permission};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/pages", get(handler::list_published))
        .route("/api/pages/{slug}", get(handler::get_by_slug))
}

/// Mounted under `/api/admin`
pub fn admin_router() -> Router<ServerState> {
    Router::new()
        .nest("/pages", admin_routes())
        .route_layer(middleware::from_fn(require_permission(permissions::PAGES_MANAGE)))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
