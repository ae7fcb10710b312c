use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::store::{Store, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use std::str::FromStr;
use std::time::Duration;

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct Repository {
    pub(crate) pool: PgPool,
}

impl Repository {
    /// Create a new repository with a connection pool
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        let statement_timeout = format!("{}s", config.statement_timeout_seconds);
        let options = PgConnectOptions::from_str(&config.url)
            .map_err(|e| AppError::Configuration(format!("Invalid database URL: {}", e)))?
            .options([("statement_timeout", statement_timeout.as_str())])
            .disable_statement_logging();

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(crate::store::StoreError::from)?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for Repository {
    async fn exists_slug(&self, slug: &str) -> StoreResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM urls WHERE slug = $1)
            "#,
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn insert_mapping(&self, slug: &str, source: &str) -> StoreResult<()> {
        // A unique violation on urls.slug is mapped to StoreError::DuplicateKey
        sqlx::query(
            r#"
            INSERT INTO urls (slug, source, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(slug)
        .bind(source)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn lookup_source(&self, slug: &str) -> StoreResult<Option<String>> {
        let result = sqlx::query_scalar::<_, String>(
            r#"
            SELECT source FROM urls
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn append_visit(&self, slug: &str, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO visits (slug, visited_at)
            VALUES ($1, $2)
            "#,
        )
        .bind(slug)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_visits(
        &self,
        slug: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> StoreResult<i64> {
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM visits
            WHERE slug = $1
              AND ($2::timestamptz IS NULL OR visited_at >= $2)
              AND ($3::timestamptz IS NULL OR visited_at <= $3)
            "#,
        )
        .bind(slug)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
