//! Checkout API
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/checkout/quote | POST | price a cart, nothing is reserved |
//! | /api/checkout | POST | place the order |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/checkout/quote", post(handler::quote))
        .route("/api/checkout", post(handler::place_order))
}
