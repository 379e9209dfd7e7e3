//! Site Settings API

mod handler;

pub use handler::validate_settings;

use axum::{Router, middleware, routing::get};

use crate::auth::{permissions, require_permission};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/settings", get(handler::get_settings))
}

/// Mounted under `/api/admin`
pub fn admin_router() -> Router<ServerState> {
    Router::new()
        .route(
            "/settings",
            get(handler::get_settings).put(handler::update_settings),
        )
        .route_layer(middleware::from_fn(require_permission(permissions::SETTINGS_MANAGE)))
}
