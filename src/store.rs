//! Persistence contract shared by the slug generator and the visit aggregator.
//!
//! The store owns all durable state: the `slug -> source` mapping table and the
//! append-only visit log. Implementations must be safe for concurrent use and
//! must enforce slug uniqueness themselves; the services only ever see the
//! outcome of an insert.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use memory::MemoryStore;

/// Failures reported by a [`Store`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The slug is already taken by another mapping.
    #[error("slug already exists")]
    DuplicateKey,

    #[error("storage operation timed out")]
    Timeout,

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::DuplicateKey,
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            // 57014 = query_canceled, raised when statement_timeout fires
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("57014") => {
                StoreError::Timeout
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Whether a mapping with this slug exists
    async fn exists_slug(&self, slug: &str) -> StoreResult<bool>;

    /// Insert a new mapping. Returns `StoreError::DuplicateKey` if the slug is taken.
    async fn insert_mapping(&self, slug: &str, source: &str) -> StoreResult<()>;

    /// Look up the source URL for a slug
    async fn lookup_source(&self, slug: &str) -> StoreResult<Option<String>>;

    /// Append a visit event. No check is made that the slug is mapped.
    async fn append_visit(&self, slug: &str, at: DateTime<Utc>) -> StoreResult<()>;

    /// Count visits for a slug within `[from, to]`; an omitted bound is open.
    async fn count_visits(
        &self,
        slug: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> StoreResult<i64>;

    /// Cheap connectivity check used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}
