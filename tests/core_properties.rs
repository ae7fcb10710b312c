//! Behavioural tests for slug generation and visit aggregation.
//!
//! These run the services against the in-memory store, so no database is
//! required.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use linkshrink::error::AppError;
use linkshrink::models::StatsSnapshot;
use linkshrink::services::slug::{is_well_formed, DEFAULT_SLUG_LENGTH};
use linkshrink::services::{Shortener, SlugGenerator, VisitAggregator};
use linkshrink::store::{MemoryStore, Store, StoreResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn services() -> (Arc<MemoryStore>, Shortener, VisitAggregator) {
    let store = Arc::new(MemoryStore::new());
    let shortener = Shortener::new(store.clone(), SlugGenerator::default(), 2048);
    let visits = VisitAggregator::new(store.clone());
    (store, shortener, visits)
}

mod shorten_tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_slugs_are_unique() {
        let (store, shortener, _) = services();
        let mut seen = HashSet::new();

        for i in 0..10_000 {
            let mapping = shortener
                .shorten(&format!("https://example.com/page/{}", i))
                .await
                .unwrap();
            assert!(is_well_formed(&mapping.slug, DEFAULT_SLUG_LENGTH));
            assert!(seen.insert(mapping.slug), "duplicate slug at iteration {}", i);
        }

        assert_eq!(store.mapping_count(), 10_000);
    }

    #[tokio::test]
    async fn test_resolve_returns_exact_source() {
        let (_, shortener, _) = services();

        for url in [
            "https://www.google.com",
            "http://localhost:3000/a/b?c=d&e=f#frag",
            "https://example.com/%E2%9C%93/Path_With-Case",
        ] {
            let mapping = shortener.shorten(url).await.unwrap();
            assert_eq!(shortener.resolve(&mapping.slug).await.unwrap(), url);
        }
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found_but_visit_is_recorded() {
        let (store, shortener, visits) = services();

        let err = shortener.resolve("zzzzzzzz").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        visits.record_visit("zzzzzzzz").await.unwrap();
        assert_eq!(store.count_visits("zzzzzzzz", None, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_shortens_get_distinct_slugs() {
        const CALLERS: usize = 200;
        let (store, shortener, _) = services();

        let handles: Vec<_> = (0..CALLERS)
            .map(|i| {
                let shortener = shortener.clone();
                tokio::spawn(async move {
                    shortener
                        .shorten(&format!("https://example.com/{}", i))
                        .await
                })
            })
            .collect();

        let mut slugs = HashSet::new();
        for handle in handles {
            let mapping = handle.await.unwrap().expect("no caller should see an error");
            slugs.insert(mapping.slug);
        }

        assert_eq!(slugs.len(), CALLERS);
        assert_eq!(store.mapping_count(), CALLERS);
    }

    /// A store whose existence check reports every slug as taken
    struct AlwaysTaken(MemoryStore);

    #[async_trait]
    impl Store for AlwaysTaken {
        async fn exists_slug(&self, _slug: &str) -> StoreResult<bool> {
            Ok(true)
        }

        async fn insert_mapping(&self, slug: &str, source: &str) -> StoreResult<()> {
            self.0.insert_mapping(slug, source).await
        }

        async fn lookup_source(&self, slug: &str) -> StoreResult<Option<String>> {
            self.0.lookup_source(slug).await
        }

        async fn append_visit(&self, slug: &str, at: DateTime<Utc>) -> StoreResult<()> {
            self.0.append_visit(slug, at).await
        }

        async fn count_visits(
            &self,
            slug: &str,
            from: Option<DateTime<Utc>>,
            to: Option<DateTime<Utc>>,
        ) -> StoreResult<i64> {
            self.0.count_visits(slug, from, to).await
        }

        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    const RIVAL_SOURCE: &str = "https://rival.example";

    /// A store where another task claims the first checked slug right after
    /// its existence check, before the caller gets to insert it
    struct ClaimedAfterCheck {
        inner: Arc<MemoryStore>,
        checks: AtomicUsize,
        claimed: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Store for ClaimedAfterCheck {
        async fn exists_slug(&self, slug: &str) -> StoreResult<bool> {
            let taken = self.inner.exists_slug(slug).await?;

            if self.checks.fetch_add(1, Ordering::SeqCst) == 0 {
                let inner = Arc::clone(&self.inner);
                let rival_slug = slug.to_string();
                tokio::spawn(async move { inner.insert_mapping(&rival_slug, RIVAL_SOURCE).await })
                    .await
                    .unwrap()?;
                *self.claimed.lock().unwrap() = Some(slug.to_string());
            }

            Ok(taken)
        }

        async fn insert_mapping(&self, slug: &str, source: &str) -> StoreResult<()> {
            self.inner.insert_mapping(slug, source).await
        }

        async fn lookup_source(&self, slug: &str) -> StoreResult<Option<String>> {
            self.inner.lookup_source(slug).await
        }

        async fn append_visit(&self, slug: &str, at: DateTime<Utc>) -> StoreResult<()> {
            self.inner.append_visit(slug, at).await
        }

        async fn count_visits(
            &self,
            slug: &str,
            from: Option<DateTime<Utc>>,
            to: Option<DateTime<Utc>>,
        ) -> StoreResult<i64> {
            self.inner.count_visits(slug, from, to).await
        }

        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slug_claimed_between_check_and_insert_is_regenerated() {
        const CALLERS: usize = 50;
        let inner = Arc::new(MemoryStore::new());
        let store = Arc::new(ClaimedAfterCheck {
            inner: Arc::clone(&inner),
            checks: AtomicUsize::new(0),
            claimed: Mutex::new(None),
        });
        let shortener = Shortener::new(store.clone(), SlugGenerator::default(), 2048);

        let handles: Vec<_> = (0..CALLERS)
            .map(|i| {
                let shortener = shortener.clone();
                tokio::spawn(async move {
                    shortener
                        .shorten(&format!("https://example.com/{}", i))
                        .await
                })
            })
            .collect();

        let mut slugs = HashSet::new();
        for handle in handles {
            let mapping = handle.await.unwrap().expect("losing the race must not surface");
            assert_ne!(mapping.source, RIVAL_SOURCE);
            slugs.insert(mapping.slug);
        }

        let claimed = store.claimed.lock().unwrap().clone().unwrap();
        assert!(!slugs.contains(&claimed));
        assert_eq!(slugs.len(), CALLERS);
        assert_eq!(inner.mapping_count(), CALLERS + 1);
        assert_eq!(
            inner.lookup_source(&claimed).await.unwrap().as_deref(),
            Some(RIVAL_SOURCE)
        );
    }

    #[tokio::test]
    async fn test_broken_existence_check_is_bounded() {
        let store = Arc::new(AlwaysTaken(MemoryStore::new()));
        let shortener = Shortener::new(store.clone(), SlugGenerator::new(8, 5), 2048);

        let err = shortener.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateSlugExhausted(5)));
        assert_eq!(store.0.mapping_count(), 0);
    }
}

mod stats_tests {
    use super::*;

    #[tokio::test]
    async fn test_never_visited_slug_is_all_zero() {
        let (_, shortener, visits) = services();
        let mapping = shortener.shorten("https://example.com").await.unwrap();

        let stats = visits.read_stats(&mapping.slug).await.unwrap();
        assert_eq!(stats, StatsSnapshot::default());
    }

    #[tokio::test]
    async fn test_window_counts() {
        let (_, _, visits) = services();
        let now = Utc::now();

        for offset in [Duration::hours(1), Duration::hours(25), Duration::days(10)] {
            visits.record_visit_at("abcd1234", now - offset).await.unwrap();
        }

        let stats = visits.read_stats_at("abcd1234", now).await.unwrap();
        assert_eq!(
            stats,
            StatsSnapshot {
                lifetime: 3,
                last_24h: 1,
                last_7d: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_recorded_visits_show_up_in_stats() {
        let (_, shortener, visits) = services();
        let mapping = shortener.shorten("https://example.com").await.unwrap();

        for _ in 0..3 {
            visits.record_visit(&mapping.slug).await.unwrap();
        }

        let stats = visits.read_stats(&mapping.slug).await.unwrap();
        assert_eq!(stats.lifetime, 3);
        assert_eq!(stats.last_24h, 3);
        assert_eq!(stats.last_7d, 3);
    }

    #[tokio::test]
    async fn test_stats_are_per_slug() {
        let (_, _, visits) = services();

        visits.record_visit("aaaaaaaa").await.unwrap();
        visits.record_visit("aaaaaaaa").await.unwrap();
        visits.record_visit("bbbbbbbb").await.unwrap();

        assert_eq!(visits.read_stats("aaaaaaaa").await.unwrap().lifetime, 2);
        assert_eq!(visits.read_stats("bbbbbbbb").await.unwrap().lifetime, 1);
    }
}
