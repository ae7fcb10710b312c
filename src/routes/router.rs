use crate::config::{CorsConfig, RateLimitConfig};
use crate::error::{AppError, AppResult};
use crate::middleware_impls::{request_id_middleware, ClientIpKeyExtractor};
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::stats_handlers;
use super::url_handlers;
use super::AppState;

/// Shorten payloads are a single URL
const MAX_SHORTEN_BODY_BYTES: usize = 16 * 1024;

/// Create application router
pub fn create_router(
    state: Arc<AppState>,
    cors_config: CorsConfig,
    rate_limit_config: RateLimitConfig,
) -> AppResult<axum::Router> {
    // Strict limits for link creation
    let governor_layer_strict = GovernorLayer::new(
        tower_governor::governor::GovernorConfigBuilder::default()
            .per_millisecond(rate_limit_config.strict_period_ms())
            .burst_size(rate_limit_config.burst_size)
            .key_extractor(ClientIpKeyExtractor)
            .finish()
            .ok_or_else(|| AppError::Configuration("Invalid strict rate limit".to_string()))?,
    );

    // More lenient limits for redirects and stats
    let governor_layer_lenient = GovernorLayer::new(
        tower_governor::governor::GovernorConfigBuilder::default()
            .per_millisecond(rate_limit_config.lenient_period_ms())
            .burst_size(rate_limit_config.lenient_burst_size())
            .key_extractor(ClientIpKeyExtractor)
            .finish()
            .ok_or_else(|| AppError::Configuration("Invalid lenient rate limit".to_string()))?,
    );

    // Configure CORS with specific origins
    let cors = if cors_config.allows_any() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<http::HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|s| s.parse::<http::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let sensitive_routes = axum::Router::new()
        .route("/api/shorten", post(url_handlers::create_url))
        .layer(DefaultBodyLimit::max(MAX_SHORTEN_BODY_BYTES))
        .layer(governor_layer_strict);

    let public_routes = axum::Router::new()
        .route("/api/stats", get(stats_handlers::get_stats))
        .route("/{slug}", get(url_handlers::resolve_url))
        .layer(governor_layer_lenient);

    // Health check endpoint (no rate limiting)
    let health_routes = axum::Router::new().route("/_health", get(health::health_check));

    Ok(sensitive_routes
        .merge(public_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state))
}
