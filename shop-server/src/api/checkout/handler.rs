//! Checkout API Handlers

use axum::{Json, extract::State};
use shared::models::{CheckoutRequest, CheckoutResponse, Quote, QuoteRequest};

use crate::AppResult;
use crate::auth::CurrentUser;
use crate::checkout;
use crate::core::ServerState;

/// POST /api/checkout/quote
pub async fn quote(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<QuoteRequest>,
) -> AppResult<Json<Quote>> {
    Ok(Json(checkout::quote(&state.pool, current.id, req).await?))
}

/// POST /api/checkout - order plus the payment step, if any
pub async fn place_order(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    let placed = checkout::place_order(&state.pool, current.id, req).await?;
    // Stock changed
    state.bump_catalog();
    Ok(Json(placed))
}
