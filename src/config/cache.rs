use serde::Deserialize;

/// Optional Redis read-through cache for slug lookups
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,

    /// `redis://` or `rediss://` URL
    pub url: String,

    /// Pool size
    pub max_connections: u32,

    /// Mappings never change, so this only bounds memory use
    pub default_ttl_seconds: u64,
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err("REDIS_URL must start with redis:// or rediss://".to_string());
        }

        if self.max_connections == 0 {
            return Err("CACHE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if self.default_ttl_seconds == 0 {
            return Err("CACHE_DEFAULT_TTL_SECONDS must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> CacheConfig {
        CacheConfig {
            enabled: true,
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 4,
            default_ttl_seconds: 60,
        }
    }

    #[test]
    fn test_disabled_cache_skips_checks() {
        let config = CacheConfig {
            enabled: false,
            url: String::new(),
            ..enabled()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enabled_cache_is_checked() {
        assert!(enabled().validate().is_ok());

        let config = CacheConfig {
            url: "http://127.0.0.1".to_string(),
            ..enabled()
        };
        assert!(config.validate().is_err());

        let config = CacheConfig {
            default_ttl_seconds: 0,
            ..enabled()
        };
        assert!(config.validate().is_err());
    }
}
