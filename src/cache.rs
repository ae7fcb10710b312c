use crate::config::CacheConfig;
use crate::error::{AppError, AppResult};
use deadpool_redis::{redis::AsyncCommands, Manager, Pool, Runtime};
use std::time::Duration;

/// Read-through cache for `slug -> source` lookups.
///
/// Mappings never change once written, so entries are only ever set and left
/// to expire.
#[derive(Clone)]
pub struct Cache {
    pool: Pool,
    default_ttl: Duration,
}

impl Cache {
    /// Create a new cache connection pool. No connection is opened until first use.
    pub fn new(config: &CacheConfig) -> AppResult<Self> {
        let manager = Manager::new(config.url.as_str())
            .map_err(|e| AppError::Configuration(format!("Invalid Redis URL: {}", e)))?;

        let pool = Pool::builder(manager)
            .max_size(config.max_connections as usize)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

        Ok(Self {
            pool,
            default_ttl: Duration::from_secs(config.default_ttl_seconds),
        })
    }

    /// Ping the Redis server to check connectivity
    pub async fn ping(&self) -> AppResult<String> {
        let mut conn = self.pool.get().await?;
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(response)
    }

    /// Get the cached source URL for a slug
    pub async fn get_source(&self, slug: &str) -> AppResult<Option<String>> {
        let key = Self::slug_key(slug);
        let mut conn = self.pool.get().await?;

        let value: Option<String> = conn.get(&key).await?;
        Ok(value)
    }

    /// Cache the source URL for a slug
    pub async fn set_source(&self, slug: &str, source: &str) -> AppResult<()> {
        let key = Self::slug_key(slug);
        let mut conn = self.pool.get().await?;

        conn.set_ex::<_, _, ()>(&key, source, self.default_ttl.as_secs())
            .await?;

        Ok(())
    }

    /// Generate cache key for a slug
    fn slug_key(slug: &str) -> String {
        format!("{}:{}", Self::KEY_PREFIX, slug)
    }

    const KEY_PREFIX: &'static str = "slug";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_key_generation() {
        assert_eq!(Cache::slug_key("abcd1234"), "slug:abcd1234");
    }

    #[test]
    fn test_new_does_not_connect() {
        let config = CacheConfig {
            enabled: true,
            url: "redis://127.0.0.1:1".to_string(),
            max_connections: 2,
            default_ttl_seconds: 60,
        };

        assert!(Cache::new(&config).is_ok());
    }
}
