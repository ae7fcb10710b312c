//! Administrative command handlers.
//!
//! CLI entry points for running migrations, printing visit statistics for a
//! slug, and pinging the cache server.

use crate::cache::Cache;
use crate::config::{Config, DatabaseBackend};
use crate::db::Repository;
use crate::error::{AppError, AppResult};
use crate::services::{Shortener, SlugGenerator, VisitAggregator};
use clap::Subcommand;
use std::sync::Arc;
use tracing::info;

/// Administrative commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Run database migrations
    Migrate,

    /// Show visit statistics for a slug
    Stats {
        /// Slug to report on
        slug: String,
    },

    /// Ping the cache server
    PingCache,
}

/// Run an administrative command with the given configuration.
pub async fn run(config: Config, admin_command: AdminCommands) -> AppResult<()> {
    match admin_command {
        AdminCommands::Migrate => migrate(config).await,
        AdminCommands::Stats { slug } => stats(config, &slug).await,
        AdminCommands::PingCache => ping_cache(config).await,
    }
}

/// Admin commands only make sense against a persistent store.
async fn connect(config: &Config) -> AppResult<Repository> {
    if config.database.backend != DatabaseBackend::Postgres {
        return Err(AppError::Configuration(
            "Admin commands require DATABASE_BACKEND=postgres".to_string(),
        ));
    }

    Repository::new(&config.database).await
}

/// Run database migrations.
async fn migrate(config: Config) -> AppResult<()> {
    info!("Running database migrations...");

    let repository = connect(&config).await?;
    repository.run_migrations().await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Display statistics for one slug.
async fn stats(config: Config, slug: &str) -> AppResult<()> {
    info!(slug = %slug, "Fetching statistics...");

    let store = Arc::new(connect(&config).await?);
    let shortener = Shortener::new(
        store.clone(),
        SlugGenerator::new(config.url.slug_length, config.url.slug_max_attempts),
        config.url.max_url_length,
    );

    let source = shortener.resolve(slug).await?;
    let snapshot = VisitAggregator::new(store).read_stats(slug).await?;

    println!("\n=== {} ===", slug);
    println!("Source:          {}", source);
    println!("Last 24 hours:   {}", snapshot.last_24h);
    println!("Last 7 days:     {}", snapshot.last_7d);
    println!("Lifetime:        {}", snapshot.lifetime);
    println!();

    Ok(())
}

/// Ping the cache server.
async fn ping_cache(config: Config) -> AppResult<()> {
    info!("Pinging cache server...");

    let cache = Cache::new(&config.cache)?;
    let response = cache.ping().await?;

    info!("Cache server responded: {}", response);

    Ok(())
}
