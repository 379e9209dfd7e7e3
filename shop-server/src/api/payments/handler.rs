//! Payment API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{
    BankTransferInstructions, CryptoInstructions, CryptoVerifyRequest, Order, PaypalCheckout,
};

use crate::AppResult;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::payments::PaymentError;
use crate::payments::service;

/// GET /api/payments/bank-transfer/{order_id}
pub async fn bank_transfer(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<BankTransferInstructions>> {
    Ok(Json(service::bank_transfer(&state.pool, current.id, order_id).await?))
}

/// POST /api/payments/paypal/{order_id}
pub async fn paypal_create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<PaypalCheckout>> {
    let client = state
        .paypal
        .as_deref()
        .ok_or(PaymentError::NotConfigured("paypal credentials"))?;
    Ok(Json(
        service::paypal_create(&state.pool, client, current.id, order_id).await?,
    ))
}

/// POST /api/payments/paypal/{order_id}/capture
pub async fn paypal_capture(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<Order>> {
    let client = state
        .paypal
        .as_deref()
        .ok_or(PaymentError::NotConfigured("paypal credentials"))?;
    Ok(Json(
        service::paypal_capture(&state.pool, client, current.id, order_id).await?,
    ))
}

/// GET /api/payments/crypto/{order_id}
pub async fn crypto_details(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(order_id): Path<i64>,
) -> AppResult<Json<CryptoInstructions>> {
    Ok(Json(service::crypto_details(&state.pool, current.id, order_id).await?))
}

/// POST /api/payments/crypto/{order_id}/verify
pub async fn crypto_verify(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(order_id): Path<i64>,
    Json(req): Json<CryptoVerifyRequest>,
) -> AppResult<Json<Order>> {
    let chain = state
        .chain
        .as_deref()
        .ok_or(PaymentError::NotConfigured("evm rpc"))?;
    Ok(Json(
        service::crypto_verify(&state.pool, chain, current.id, order_id, &req.tx_hash).await?,
    ))
}
