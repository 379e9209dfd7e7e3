//! Order API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{permissions, require_permission};
use crate::core::ServerState;

/// The customer's own orders
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", get(handler::list_mine))
        .route("/api/orders/{id}", get(handler::get_mine))
        .route("/api/orders/{id}/cancel", post(handler::cancel_mine))
}

/// Mounted under `/api/admin`
pub fn admin_router() -> Router<ServerState> {
    Router::new()
        .nest("/orders", admin_routes())
        .route_layer(middleware::from_fn(require_permission(permissions::ORDERS_MANAGE)))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/mark-paid", post(handler::mark_paid))
        .route("/{id}/payments", get(handler::payment_history))
}
