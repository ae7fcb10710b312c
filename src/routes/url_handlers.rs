use crate::error::{AppError, AppResult};
use crate::models::{CreateUrlRequest, CreateUrlResponse};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect};
use std::sync::Arc;
use tracing::warn;
use validator::Validate;

use super::AppState;

/// Create a short URL
pub async fn create_url(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUrlRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(format!("Validation failed: {}", e)))?;

    let mapping = state.shortener.shorten(&payload.url).await?;

    // Warm the cache; a failure here only costs a later store lookup
    if let Some(cache) = &state.cache {
        if let Err(e) = cache.set_source(&mapping.slug, &mapping.source).await {
            warn!(slug = %mapping.slug, error = %e, "Failed to cache new mapping");
        }
    }

    let response = CreateUrlResponse {
        shortened_url: format!("{}/{}", state.base_url, mapping.slug),
        slug: mapping.slug,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Resolve a slug and redirect
pub async fn resolve_url(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let source = lookup_source(&state, &slug).await?;

    let redirect = Redirect::permanent(&source);

    // Queued after the response is built; the worker owns persistence and failures
    state.job_sender.record_visit(slug);

    Ok(redirect)
}

/// Resolve through the cache when enabled, falling back to the store
pub(crate) async fn lookup_source(state: &AppState, slug: &str) -> AppResult<String> {
    if let Some(cache) = &state.cache {
        match cache.get_source(slug).await {
            Ok(Some(source)) => return Ok(source),
            Ok(None) => {}
            Err(e) => warn!(slug = %slug, error = %e, "Cache lookup failed, using store"),
        }
    }

    let source = state.shortener.resolve(slug).await?;

    if let Some(cache) = &state.cache {
        if let Err(e) = cache.set_source(slug, &source).await {
            warn!(slug = %slug, error = %e, "Failed to cache mapping");
        }
    }

    Ok(source)
}
