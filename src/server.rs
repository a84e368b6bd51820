//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, worker spawning, and Axum
//! server lifecycle.

use crate::application::services::{AnalyticsService, IngestService, LinkService};
use crate::config::Config;
use crate::domain::visit_worker::run_visit_worker;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::geo::{GeoLookup, HttpGeoLookup, NullGeoLookup};
use crate::infrastructure::persistence::{PgEventRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis cache (or NullCache fallback)
/// - Geo lookup client (when configured)
/// - Background visit worker
/// - Axum HTTP server
///
/// # Errors
///
/// Returns an error if the database connection, migration run, server bind,
/// or server runtime fails. A Redis connection failure is not fatal; the
/// service degrades to running uncached.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache: Arc<dyn CacheService> = if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
        Arc::new(NullCache::new())
    };

    let geo: Arc<dyn GeoLookup> = match &config.geo_lookup_url {
        Some(url) => {
            tracing::info!("Geo lookup enabled");
            Arc::new(HttpGeoLookup::new(url.clone()))
        }
        None => Arc::new(NullGeoLookup),
    };

    let pool_arc = Arc::new(pool);
    let link_repository = Arc::new(PgLinkRepository::new(pool_arc.clone()));
    let event_repository = Arc::new(PgEventRepository::new(pool_arc));

    let link_service = Arc::new(LinkService::new(
        link_repository,
        cache.clone(),
        config.code_length,
        config.code_max_attempts,
    ));
    let analytics_service = Arc::new(AnalyticsService::new(
        event_repository.clone(),
        cache.clone(),
        config.aggregation_interval_minutes,
        config.timeline_interval,
        config.refresh_single_flight,
    ));
    let ingest_service = Arc::new(IngestService::new(event_repository, cache.clone(), geo));

    let (visit_tx, visit_rx) = mpsc::channel(config.visit_queue_capacity);
    tokio::spawn(run_visit_worker(visit_rx, ingest_service));
    tracing::info!("Visit worker started");

    let state = AppState::new(link_service, analytics_service, cache, visit_tx);

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;

    Ok(())
}
