//! Cache service trait and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::entities::EventKind;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Fast approximate visit counters for one short code.
///
/// Maintained incrementally on every ingested event; advisory only. The
/// aggregator always re-derives authoritative numbers from the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityCounters {
    pub clicks: i64,
    pub total_activities: i64,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Cached pre-computed analytics for one short code.
///
/// The four blobs are serialized JSON; `last_updated` is the wall-clock
/// time they were last recomputed from the event log and is compared
/// against [`ActivityCounters::last_activity`] to judge staleness.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAggregates {
    pub last_updated: DateTime<Utc>,
    pub overview: String,
    pub timeline: String,
    pub referrers: String,
    pub location: String,
}

/// Trait covering the three cache roles: redirect mappings, metrics
/// counters, and pre-computed analytics.
///
/// Implementations must be thread-safe and handle errors gracefully without
/// disrupting the application (cache failures degrade to database lookups).
/// Only single-key atomicity is assumed; counter increments must not be
/// read-modify-write.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::MemoryCache`] - in-process cache for tests/development
/// - [`crate::infrastructure::cache::NullCache`] - no-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the destination URL for a short code from cache.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(url))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>>;

    /// Stores a short-code → URL mapping with optional TTL.
    ///
    /// # Errors
    ///
    /// Should not propagate errors to callers. Implementations log errors
    /// and return `Ok(())` to avoid disrupting the request flow.
    async fn set_url(
        &self,
        short_code: &str,
        destination_url: &str,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes a cached URL mapping.
    ///
    /// Called synchronously by any edit/delete path before the change is
    /// acknowledged, bounding the staleness window.
    async fn invalidate(&self, short_code: &str) -> CacheResult<()>;

    /// Atomically bumps the metrics counters for one ingested event.
    ///
    /// Increments `total_activities` always, `clicks` for click events, and
    /// overwrites `last_activity` with the event timestamp.
    async fn record_activity(
        &self,
        short_code: &str,
        kind: EventKind,
        occurred_at: DateTime<Utc>,
    ) -> CacheResult<()>;

    /// Reads the metrics counters for a short code.
    ///
    /// `Ok(None)` when no events were ever counted (or the backend is
    /// unavailable; callers fall back to the durable log).
    async fn read_activity(&self, short_code: &str) -> CacheResult<Option<ActivityCounters>>;

    /// Reads the cached analytics entry for a short code.
    ///
    /// `Ok(None)` when the entry is absent or incomplete, which callers
    /// treat as unconditionally stale.
    async fn read_aggregates(&self, short_code: &str) -> CacheResult<Option<CachedAggregates>>;

    /// Overwrites the cached analytics entry wholesale.
    async fn write_aggregates(
        &self,
        short_code: &str,
        aggregates: &CachedAggregates,
    ) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    ///
    /// Used by health check endpoints to report cache status.
    async fn health_check(&self) -> bool;
}
