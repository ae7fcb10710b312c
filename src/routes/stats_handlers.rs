use crate::error::{AppError, AppResult};
use crate::models::{StatsQuery, StatsResponse};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use std::sync::Arc;

use super::url_handlers::lookup_source;
use super::AppState;

/// Visit statistics for one slug (`GET /api/stats?id=<slug>`)
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> AppResult<impl IntoResponse> {
    let slug = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing id query parameter".to_string()))?;

    // Unknown slugs are a 404 here even though the visit log may hold events for them
    let source = lookup_source(&state, &slug).await?;
    let snapshot = state.visits.read_stats(&slug).await?;

    Ok(Json(StatsResponse {
        slug,
        source,
        visits: snapshot.into(),
    }))
}
