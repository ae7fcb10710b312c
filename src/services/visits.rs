use crate::error::{AppError, AppResult};
use crate::models::StatsSnapshot;
use crate::store::Store;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Visits stamped further ahead of the local clock than this are rejected.
const MAX_CLOCK_SKEW_SECONDS: i64 = 60;

/// Records visit events and computes rolling counts over them.
#[derive(Clone)]
pub struct VisitAggregator {
    store: Arc<dyn Store>,
}

impl VisitAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append a visit stamped with the current UTC time
    pub async fn record_visit(&self, slug: &str) -> AppResult<()> {
        self.record_visit_at(slug, Utc::now()).await
    }

    /// Append a visit stamped `at`. Slugs are not checked against the mapping table.
    pub async fn record_visit_at(&self, slug: &str, at: DateTime<Utc>) -> AppResult<()> {
        if at > Utc::now() + Duration::seconds(MAX_CLOCK_SKEW_SECONDS) {
            return Err(AppError::InvalidInput(format!(
                "visit timestamp {} is in the future",
                at
            )));
        }

        self.store.append_visit(slug, at).await?;
        Ok(())
    }

    /// Lifetime, last-24-hour and last-7-day visit counts as of now
    pub async fn read_stats(&self, slug: &str) -> AppResult<StatsSnapshot> {
        self.read_stats_at(slug, Utc::now()).await
    }

    /// Counts as of `now`. Both windows share the same upper bound.
    ///
    /// A slug with no visits at all returns zeros after a single count.
    pub async fn read_stats_at(&self, slug: &str, now: DateTime<Utc>) -> AppResult<StatsSnapshot> {
        let lifetime = self.store.count_visits(slug, None, None).await?;
        if lifetime == 0 {
            return Ok(StatsSnapshot::default());
        }

        let last_24h = self
            .store
            .count_visits(slug, Some(now - Duration::hours(24)), Some(now))
            .await?;
        let last_7d = self
            .store
            .count_visits(slug, Some(now - Duration::days(7)), Some(now))
            .await?;

        Ok(StatsSnapshot {
            lifetime,
            last_24h,
            last_7d,
        })
    }
}
