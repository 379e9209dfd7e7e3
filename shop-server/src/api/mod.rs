//! API routes
//!
//! # Structure
//!
//! - [`health`] - health check and catalog version
//! - [`auth`] - register, login, current user
//! - [`categories`] - category tree (storefront + admin)
//! - [`products`] - products (storefront + admin)
//! - [`vouchers`] - public vouchers, cart check, admin CRUD
//! - [`checkout`] - quotes and order placement
//! - [`orders`] - customer orders, admin order management
//! - [`payments`] - bank transfer, PayPal, crypto
//! - [`pages`] - content pages
//! - [`settings`] - site settings
//! - [`users`] - admin user management
//! - [`roles`] - admin role management
//!
//! Storefront routes live under `/api`, admin routes under `/api/admin`
//! behind [`require_auth`] plus a per-module permission.

pub mod auth;
pub mod categories;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod pages;
pub mod payments;
pub mod products;
pub mod roles;
pub mod settings;
pub mod users;
pub mod vouchers;

use axum::Router;
use axum::middleware;
use http::HeaderValue;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::ServerState;

/// UUID v4 per request
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Every route, without state or tower middleware
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    let admin = Router::new()
        .merge(categories::admin_router())
        .merge(products::admin_router())
        .merge(vouchers::admin_router())
        .merge(orders::admin_router())
        .merge(pages::admin_router())
        .merge(settings::admin_router())
        .merge(users::admin_router())
        .merge(roles::admin_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Public
        .merge(health::router())
        .merge(auth::router(state))
        .merge(categories::router())
        .merge(products::router())
        .merge(pages::router())
        .merge(settings::router())
        // Customer (CurrentUser extractor)
        .merge(vouchers::router())
        .merge(checkout::router())
        .merge(orders::router())
        .merge(payments::router())
        // Staff
        .nest("/api/admin", admin)
}

/// Fully configured application, used by the server and by oneshot tests
pub fn build_app(state: &ServerState) -> Router {
    // Outermost first: the request id exists before the trace span opens
    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(XRequestId))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive());

    build_router(state)
        .with_state(state.clone())
        .layer(layers)
}
