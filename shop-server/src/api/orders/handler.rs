//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::PaginatedResponse;
use shared::models::{Order, OrderQuery, OrderStatus, OrderStatusUpdate, Payment};

use crate::AppResult;
use crate::auth::CurrentUser;
use crate::checkout;
use crate::core::ServerState;
use crate::payments::service as payments;

/// GET /api/orders
pub async fn list_mine(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    Ok(Json(checkout::list(&state.pool, Some(current.id), query).await?))
}

/// GET /api/orders/{id}
pub async fn get_mine(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(checkout::get_for_user(&state.pool, current.id, id).await?))
}

/// POST /api/orders/{id}/cancel - pending and unpaid only
pub async fn cancel_mine(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let cancelled = checkout::cancel_by_customer(&state.pool, current.id, id).await?;
    state.bump_catalog();
    Ok(Json(cancelled))
}

/// GET /api/admin/orders
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    Ok(Json(checkout::list(&state.pool, None, query).await?))
}

/// GET /api/admin/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(checkout::get(&state.pool, id).await?))
}

/// PUT /api/admin/orders/{id}/status
pub async fn update_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    let updated = checkout::update_status(&state.pool, id, payload.status).await?;
    tracing::info!(
        order_id = id,
        status = ?updated.status,
        staff_id = current.id,
        "Order status changed by staff"
    );
    if payload.status == OrderStatus::Cancelled {
        state.bump_catalog();
    }
    Ok(Json(updated))
}

/// POST /api/admin/orders/{id}/mark-paid - COD / bank transfer confirmation
pub async fn mark_paid(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let paid = payments::mark_paid(&state.pool, id).await?;
    tracing::info!(order_id = id, staff_id = current.id, "Order marked paid by staff");
    Ok(Json(paid))
}

/// GET /api/admin/orders/{id}/payments
pub async fn payment_history(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Payment>>> {
    Ok(Json(payments::history(&state.pool, id).await?))
}
