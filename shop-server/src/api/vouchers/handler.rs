//! Voucher API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{
    PublicVoucher, Voucher, VoucherCheckRequest, VoucherCheckResponse, VoucherCreate,
    VoucherUpdate, VoucherWithStats,
};

use crate::AppResult;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::vouchers;

/// GET /api/vouchers - active, currently valid vouchers
pub async fn list_public(State(state): State<ServerState>) -> AppResult<Json<Vec<PublicVoucher>>> {
    Ok(Json(vouchers::list_public(&state.pool).await?))
}

/// POST /api/vouchers/check - preview a discount without redeeming
pub async fn check(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<VoucherCheckRequest>,
) -> AppResult<Json<VoucherCheckResponse>> {
    Ok(Json(vouchers::check(&state.pool, current.id, req).await?))
}

/// GET /api/admin/vouchers - with redemption counts
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<VoucherWithStats>>> {
    Ok(Json(vouchers::list_admin(&state.pool).await?))
}

/// GET /api/admin/vouchers/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Voucher>> {
    Ok(Json(vouchers::get(&state.pool, id).await?))
}

/// POST /api/admin/vouchers
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<VoucherCreate>,
) -> AppResult<Json<Voucher>> {
    Ok(Json(vouchers::create(&state.pool, payload).await?))
}

/// PUT /api/admin/vouchers/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<VoucherUpdate>,
) -> AppResult<Json<Voucher>> {
    Ok(Json(vouchers::update(&state.pool, id, payload).await?))
}

/// DELETE /api/admin/vouchers/{id} - deactivates
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    vouchers::delete(&state.pool, id).await?;
    Ok(Json(true))
}
