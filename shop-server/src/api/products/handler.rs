//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::PaginatedResponse;
use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate};

use crate::AppResult;
use crate::catalog::products;
use crate::core::ServerState;

/// GET /api/products - active products, filtered and paginated
pub async fn list_public(
    State(state): State<ServerState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    Ok(Json(products::list(&state.pool, query, true).await?))
}

/// GET /api/products/{slug}
pub async fn get_by_slug(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Product>> {
    Ok(Json(products::get_by_slug(&state.pool, &slug).await?))
}

/// GET /api/admin/products - includes inactive products
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    Ok(Json(products::list(&state.pool, query, false).await?))
}

/// GET /api/admin/products/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    Ok(Json(products::get(&state.pool, id).await?))
}

/// POST /api/admin/products
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    let product = products::create(&state.pool, payload).await?;
    state.bump_catalog();
    Ok(Json(product))
}

/// PUT /api/admin/products/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    let product = products::update(&state.pool, id, payload).await?;
    state.bump_catalog();
    Ok(Json(product))
}

/// DELETE /api/admin/products/{id} - soft delete
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    products::delete(&state.pool, id).await?;
    state.bump_catalog();
    Ok(Json(true))
}
