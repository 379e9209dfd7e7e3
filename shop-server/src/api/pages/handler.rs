//! Content Page API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Page, PageCreate, PageSummary, PageUpdate};
use sqlx::SqlitePool;

use crate::core::ServerState;
use crate::db::repository::page;
use crate::utils::slug::{ensure_unique_slug, slug_source};
use crate::utils::validation::{
    MAX_CONTENT_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use crate::{AppError, AppResult, ErrorCode};

fn not_found() -> AppError {
    AppError::new(ErrorCode::PageNotFound)
}

async fn unique_slug(pool: &SqlitePool, base: &str, exclude_id: Option<i64>) -> AppResult<String> {
    let slug = ensure_unique_slug(base, |candidate| async move {
        page::slug_exists(pool, &candidate, exclude_id).await
    })
    .await?;
    Ok(slug)
}

/// GET /api/pages - published pages for the storefront menu
pub async fn list_published(State(state): State<ServerState>) -> AppResult<Json<Vec<PageSummary>>> {
    Ok(Json(page::find_published(&state.pool).await?))
}

/// GET /api/pages/{slug}
pub async fn get_by_slug(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
) -> AppResult<Json<Page>> {
    page::find_published_by_slug(&state.pool, &slug)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// GET /api/admin/pages - drafts included
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Page>>> {
    Ok(Json(page::find_all(&state.pool).await?))
}

/// GET /api/admin/pages/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Page>> {
    page::find_by_id(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// POST /api/admin/pages
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<PageCreate>,
) -> AppResult<Json<Page>> {
    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_optional_text(&payload.excerpt, "excerpt", MAX_NOTE_LEN)?;
    if payload.content.len() > MAX_CONTENT_LEN {
        return Err(AppError::validation(format!(
            "content is too long (max {MAX_CONTENT_LEN} bytes)"
        )));
    }

    let base = slug_source(payload.slug.as_deref(), &payload.title);
    let now = shared::util::now_millis();
    let new = Page {
        id: shared::util::snowflake_id(),
        title: payload.title.trim().to_string(),
        slug: unique_slug(&state.pool, &base, None).await?,
        content: payload.content,
        excerpt: payload.excerpt,
        is_published: payload.is_published.unwrap_or(false),
        sort_order: payload.sort_order.unwrap_or(0),
        created_at: now,
        updated_at: now,
    };
    let created = page::insert(&state.pool, &new).await?;
    tracing::info!(page_id = created.id, slug = %created.slug, "Page created");
    Ok(Json(created))
}

/// PUT /api/admin/pages/{id} - the slug only changes when one is given
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(mut payload): Json<PageUpdate>,
) -> AppResult<Json<Page>> {
    page::find_by_id(&state.pool, id).await?.ok_or_else(not_found)?;

    if let Some(title) = payload.title.as_mut() {
        validate_required_text(title, "title", MAX_NAME_LEN)?;
        *title = title.trim().to_string();
    }
    validate_optional_text(&payload.excerpt, "excerpt", MAX_NOTE_LEN)?;
    if payload.content.as_ref().is_some_and(|c| c.len() > MAX_CONTENT_LEN) {
        return Err(AppError::validation(format!(
            "content is too long (max {MAX_CONTENT_LEN} bytes)"
        )));
    }

    let slug = match payload.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => {
            let base = slug_source(Some(explicit), explicit);
            Some(unique_slug(&state.pool, &base, Some(id)).await?)
        }
        None => None,
    };

    let updated = page::update(&state.pool, id, payload, slug).await?;
    Ok(Json(updated))
}

/// DELETE /api/admin/pages/{id}
pub async fn delete(State(state): State<ServerState>, Path(id): Path<i64>) -> AppResult<Json<bool>> {
    if !page::delete(&state.pool, id).await? {
        return Err(not_found());
    }
    tracing::info!(page_id = id, "Page deleted");
    Ok(Json(true))
}
