mod cache;
mod database;
mod http;
mod rate_limit;
mod url;
mod visits;

pub use self::cache::CacheConfig;
pub use self::database::{DatabaseBackend, DatabaseConfig};
pub use self::http::{CorsConfig, ServerConfig};
pub use self::rate_limit::RateLimitConfig;
pub use self::url::UrlConfig;
pub use self::visits::VisitConfig;

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub url: UrlConfig,
    pub visits: VisitConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

/// Read `key`, falling back to `default`, and parse it.
fn env_or<T: FromStr>(key: &str, default: &str) -> AppResult<T> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", key)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port: u16 = env_or("SERVER_PORT", "3000")?;

        let backend = match env::var("DATABASE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "memory" => DatabaseBackend::Memory,
            other => {
                return Err(AppError::Configuration(format!(
                    "Unknown DATABASE_BACKEND '{}'. Supported values: postgres, memory",
                    other
                )))
            }
        };
        let database_url = match backend {
            DatabaseBackend::Postgres => env::var("DATABASE_URL")
                .map_err(|_| AppError::MissingEnvVar("DATABASE_URL".to_string()))?,
            DatabaseBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        // Public base URL: BASE_URL wins, then SCHEME + HOSTNAME, then the bind address
        let base_url = match (env::var("BASE_URL"), env::var("SCHEME"), env::var("HOSTNAME")) {
            (Ok(base_url), _, _) => base_url,
            (Err(_), Ok(scheme), Ok(hostname)) => format!("{}://{}", scheme, hostname),
            _ => format!("http://{}:{}", server_host, server_port),
        };

        let config = Config {
            server: ServerConfig {
                host: server_host,
                port: server_port,
            },
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections: env_or("DB_MAX_CONNECTIONS", "10")?,
                min_connections: env_or("DB_MIN_CONNECTIONS", "1")?,
                acquire_timeout_seconds: env_or("DB_ACQUIRE_TIMEOUT_SECONDS", "30")?,
                statement_timeout_seconds: env_or("DB_STATEMENT_TIMEOUT_SECONDS", "5")?,
            },
            cache: CacheConfig {
                enabled: env_or("CACHE_ENABLED", "false")?,
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
                max_connections: env_or("CACHE_MAX_CONNECTIONS", "10")?,
                default_ttl_seconds: env_or("CACHE_DEFAULT_TTL_SECONDS", "3600")?,
            },
            url: UrlConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                slug_length: env_or("SLUG_LENGTH", "8")?,
                slug_max_attempts: env_or("SLUG_MAX_ATTEMPTS", "5")?,
                max_url_length: env_or("MAX_URL_LENGTH", "2048")?,
            },
            visits: VisitConfig {
                queue_capacity: env_or("VISIT_QUEUE_CAPACITY", "1024")?,
                max_retries: env_or("VISIT_MAX_RETRIES", "3")?,
                retry_delay_ms: env_or("VISIT_RETRY_DELAY_MS", "200")?,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: env_or("RATE_LIMIT_PER_MINUTE", "60")?,
                burst_size: env_or("RATE_LIMIT_BURST", "10")?,
            },
            cors: CorsConfig::from_list(
                &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            ),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        self.server
            .validate()
            .and_then(|_| self.database.validate())
            .and_then(|_| self.cache.validate())
            .and_then(|_| self.url.validate())
            .and_then(|_| self.visits.validate())
            .and_then(|_| self.rate_limit.validate())
            .and_then(|_| self.cors.validate())
            .map_err(AppError::Configuration)
    }
}
