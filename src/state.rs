use crate::cache::Cache;
use crate::jobs::JobSender;
use crate::services::{Shortener, VisitAggregator};
use crate::store::Store;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This struct is wrapped in `Arc` and shared across all request handlers
/// via Axum's State extraction. It is built once at startup from `Config`;
/// handlers never read the process environment.
#[derive(Clone)]
pub struct AppState {
    /// Backing store, used directly only for health checks
    pub store: Arc<dyn Store>,

    /// Slug creation and resolution
    pub shortener: Shortener,

    /// Visit counts for the stats endpoint
    pub visits: VisitAggregator,

    /// Redis cache for slug lookups, present when caching is enabled
    pub cache: Option<Cache>,

    /// Queue feeding the background visit worker
    pub job_sender: JobSender,

    /// Base URL for constructing short URLs (e.g., "http://localhost:3000")
    pub base_url: String,
}
