use super::{Store, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-process store backed by `DashMap`.
///
/// Used for the `memory` database backend and as the store double in tests.
/// Insert uniqueness is enforced per shard through the entry API, so concurrent
/// inserts of the same slug resolve to exactly one winner.
#[derive(Debug, Default)]
pub struct MemoryStore {
    urls: DashMap<String, String>,
    visits: DashMap<String, Vec<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored mappings
    pub fn mapping_count(&self) -> usize {
        self.urls.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn exists_slug(&self, slug: &str) -> StoreResult<bool> {
        Ok(self.urls.contains_key(slug))
    }

    async fn insert_mapping(&self, slug: &str, source: &str) -> StoreResult<()> {
        match self.urls.entry(slug.to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey),
            Entry::Vacant(slot) => {
                slot.insert(source.to_string());
                Ok(())
            }
        }
    }

    async fn lookup_source(&self, slug: &str) -> StoreResult<Option<String>> {
        Ok(self.urls.get(slug).map(|source| source.value().clone()))
    }

    async fn append_visit(&self, slug: &str, at: DateTime<Utc>) -> StoreResult<()> {
        self.visits.entry(slug.to_string()).or_default().push(at);
        Ok(())
    }

    async fn count_visits(
        &self,
        slug: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> StoreResult<i64> {
        let count = self.visits.get(slug).map_or(0, |events| {
            events
                .iter()
                .filter(|at| from.map_or(true, |from| **at >= from))
                .filter(|at| to.map_or(true, |to| **at <= to))
                .count()
        });

        Ok(count as i64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
