//! HTTP server initialization and runtime setup.
//!
//! Handles storage selection, cache setup, worker spawning, and Axum server lifecycle.

use crate::api::middleware::rate_limit::RateLimit;
use crate::application::services::VisitLocator;
use crate::config::{Config, StorageBackend};
use crate::domain::location_worker::run_location_worker;
use crate::infrastructure::cache::{LocationCache, NullCache, RedisCache};
use crate::infrastructure::geolocation::IpApiLocationResolver;
use crate::infrastructure::persistence::Repositories;
use crate::infrastructure::url_validator::{HttpUrlValidator, NoopUrlValidator, UrlValidator};
use crate::routes::app_router;
use crate::state::{AppState, StateOptions};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Opens the configured store.
///
/// For Postgres this connects the pool and applies the embedded migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect_repositories(config: &Config) -> Result<Repositories> {
    match (config.storage, &config.database_url) {
        (StorageBackend::Postgres, Some(database_url)) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
                .idle_timeout(Duration::from_secs(config.db_idle_timeout))
                .max_lifetime(Duration::from_secs(config.db_max_lifetime))
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to apply migrations")?;

            Ok(Repositories::postgres(Arc::new(pool)))
        }
        (StorageBackend::Postgres, None) => {
            anyhow::bail!("Postgres storage selected but no database URL is configured")
        }
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Ok(Repositories::in_memory())
        }
    }
}

/// Connects the location cache, falling back to [`NullCache`].
pub async fn connect_cache(config: &Config) -> Arc<dyn LocationCache> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Location cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.location_cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Location cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

/// Builds the locator used by the background worker and `visit process`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_locator(
    config: &Config,
    repositories: &Repositories,
    cache: Arc<dyn LocationCache>,
) -> Result<VisitLocator> {
    let resolver = IpApiLocationResolver::new(config.ip_api_url.clone())
        .context("Failed to build IP location client")?;
    Ok(VisitLocator::new(
        repositories.visits.clone(),
        Arc::new(resolver),
        cache,
    ))
}

/// HTTP reachability check when `VALIDATE_URL` is on, otherwise accepts everything.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_url_validator(config: &Config) -> Result<Arc<dyn UrlValidator>> {
    if config.validate_url {
        let validator = HttpUrlValidator::new().context("Failed to build URL validation client")?;
        Ok(Arc::new(validator))
    } else {
        Ok(Arc::new(NoopUrlValidator))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Storage (PostgreSQL pool with migrations, or the in-memory store)
/// - Redis location cache (or NullCache fallback)
/// - Background location worker
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let repositories = connect_repositories(&config).await?;
    let cache = connect_cache(&config).await;

    let (locate_tx, locate_rx) = mpsc::channel(config.location_queue_capacity);
    let locator = build_locator(&config, &repositories, cache.clone())?;
    tokio::spawn(run_location_worker(locate_rx, Arc::new(locator)));
    tracing::info!("Location worker started");

    let state = AppState::new(
        &repositories,
        StateOptions::from_config(&config)?,
        build_url_validator(&config)?,
        cache,
        locate_tx,
    );

    let app = app_router(state, RateLimit::from_config(&config))?;

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}
