//! Category API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::{permissions, require_permission};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/categories", get(handler::list_public))
        .route("/api/categories/tree", get(handler::tree_public))
        .route("/api/categories/slug/{slug}", get(handler::get_by_slug))
}

/// Mounted under `/api/admin`
pub fn admin_router() -> Router<ServerState> {
    Router::new()
        .nest("/categories", admin_routes())
        .route_layer(middleware::from_fn(require_permission(permissions::CATALOG_MANAGE)))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/tree", get(handler::tree))
        // Before /{id} to avoid path conflicts
        .route("/sort-order", put(handler::batch_update_sort_order))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
