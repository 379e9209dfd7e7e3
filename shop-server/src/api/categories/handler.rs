//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{
    Category, CategoryCreate, CategoryDetail, CategoryNode, CategoryUpdate, SortOrderUpdate,
};

use crate::AppResult;
use crate::catalog::categories;
use crate::core::ServerState;

/// GET /api/categories - active categories, flat
pub async fn list_public(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(categories::list(&state.pool, true).await?))
}

/// GET /api/categories/tree - active categories, nested
pub async fn tree_public(State(state): State<ServerState>) -> AppResult<Json<Vec<CategoryNode>>> {
    Ok(Json(categories::tree(&state.pool, true).await?))
}

/// GET /api/categories/slug/{slug} - category page with breadcrumbs
pub async fn get_by_slug(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> AppResult<Json<CategoryDetail>> {
    Ok(Json(categories::detail_by_slug(&state.pool, &slug).await?))
}

/// GET /api/admin/categories
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(categories::list(&state.pool, false).await?))
}

/// GET /api/admin/categories/tree
pub async fn tree(State(state): State<ServerState>) -> AppResult<Json<Vec<CategoryNode>>> {
    Ok(Json(categories::tree(&state.pool, false).await?))
}

/// GET /api/admin/categories/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    Ok(Json(categories::get(&state.pool, id).await?))
}

/// POST /api/admin/categories
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<Category>> {
    let category = categories::create(&state.pool, state.config.max_category_depth, payload).await?;
    state.bump_catalog();
    Ok(Json(category))
}

/// PUT /api/admin/categories/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    let category =
        categories::update(&state.pool, state.config.max_category_depth, id, payload).await?;
    state.bump_catalog();
    Ok(Json(category))
}

/// DELETE /api/admin/categories/{id}
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    categories::delete(&state.pool, id).await?;
    state.bump_catalog();
    Ok(Json(true))
}

/// PUT /api/admin/categories/sort-order
pub async fn batch_update_sort_order(
    State(state): State<ServerState>,
    Json(updates): Json<Vec<SortOrderUpdate>>,
) -> AppResult<Json<bool>> {
    categories::sort_orders(&state.pool, &updates).await?;
    state.bump_catalog();
    Ok(Json(true))
}
