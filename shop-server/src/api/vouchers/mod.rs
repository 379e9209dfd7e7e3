//! Voucher API

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{permissions, require_permission};
use crate::core::ServerState;

/// - GET /api/vouchers: public banner list
/// - POST /api/vouchers/check: logged-in customer
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/vouchers", get(handler::list_public))
        .route("/api/vouchers/check", post(handler::check))
}

/// Mounted under `/api/admin`
pub fn admin_router() -> Router<ServerState> {
    Router::new()
        .nest("/vouchers", admin_routes())
        .route_layer(middleware::from_fn(require_permission(permissions::VOUCHERS_MANAGE)))
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
