//! Server startup, shutdown, and worker spawning logic.
//!
//! This module contains the `run_server` function which handles:
//! - Store and cache initialization
//! - Migration running
//! - Application state creation
//! - Router creation
//! - Server binding and graceful shutdown
//! - Background visit worker spawning and draining

use crate::cache::Cache;
use crate::config::{Config, DatabaseBackend};
use crate::db::Repository;
use crate::error::{AppError, AppResult};
use crate::jobs::{create_job_channel, Worker, WorkerConfig};
use crate::routes;
use crate::services::{Shortener, SlugGenerator, VisitAggregator};
use crate::state::AppState;
use crate::store::{MemoryStore, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Open the configured store, running migrations first when asked to.
pub async fn open_store(config: &Config, should_migrate: bool) -> AppResult<Arc<dyn Store>> {
    match config.database.backend {
        DatabaseBackend::Postgres => {
            info!("Connecting to database...");
            let repository = Repository::new(&config.database).await?;

            if should_migrate {
                info!("Running database migrations...");
                repository.run_migrations().await?;
                info!("Migrations completed successfully");
            }

            Ok(Arc::new(repository))
        }
        DatabaseBackend::Memory => {
            warn!("Using in-memory store; all links are lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Build the shared application state and the visit worker that drains its queue.
pub fn build_state(config: &Config, store: Arc<dyn Store>, cache: Option<Cache>) -> (AppState, Worker) {
    let generator = SlugGenerator::new(config.url.slug_length, config.url.slug_max_attempts);
    let shortener = Shortener::new(Arc::clone(&store), generator, config.url.max_url_length);
    let visits = VisitAggregator::new(Arc::clone(&store));

    let (job_sender, job_receiver) = create_job_channel(config.visits.queue_capacity);
    let worker = Worker::new(visits.clone(), job_receiver)
        .with_config(WorkerConfig::from(&config.visits));

    let state = AppState {
        store,
        shortener,
        visits,
        cache,
        job_sender,
        base_url: config.url.base_url.clone(),
    };

    (state, worker)
}

/// Run the web server with the given configuration.
///
/// # Errors
///
/// This function will return an error if:
/// - Database connection fails
/// - Migration fails
/// - Server binding fails
/// - Server runtime error occurs
///
/// An unreachable cache is logged and tolerated.
pub async fn run_server(config: Config, addr: String, should_migrate: bool) -> AppResult<()> {
    info!("Starting linkshrink server...");

    let store = open_store(&config, should_migrate).await?;

    let cache = if config.cache.enabled {
        info!("Connecting to cache...");
        let cache = Cache::new(&config.cache)?;
        match cache.ping().await {
            Ok(_) => info!("Cache connection verified"),
            Err(e) => warn!("Cache ping failed: {}. Lookups will fall back to the store.", e),
        }
        Some(cache)
    } else {
        None
    };

    let (state, worker) = build_state(&config, store, cache);

    // Start background worker in separate task
    let worker_handle = tokio::spawn(worker.run());

    let app = routes::create_router(Arc::new(state), config.cors, config.rate_limit)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Base URL: {}", config.url.base_url);

    // Run server with graceful shutdown; the router (and its job sender) is
    // dropped when this returns, which lets the worker drain and exit.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    if let Err(e) = worker_handle.await {
        error!("Worker task failed: {:?}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Create a future that resolves when a shutdown signal is received.
///
/// On Unix-like systems, this listens for both Ctrl+C (SIGINT) and SIGTERM.
/// On other platforms, it only listens for Ctrl+C. If a handler cannot be
/// installed, that signal source is ignored and the other one still applies.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}
