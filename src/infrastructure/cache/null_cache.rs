//! No-op cache implementation for testing or disabled caching.

use super::service::{
    ActivityCounters, CacheResult, CacheService, CachedAggregates,
};
use crate::domain::entities::EventKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Used when Redis is unavailable or caching is explicitly disabled.
/// Redirect lookups always miss (falling through to the store), counters
/// are never kept, and analytics reads come back absent, so every
/// analytics request recomputes from the durable log.
///
/// # Use Cases
///
/// - Development environments without Redis
/// - Testing scenarios where caching should be bypassed
/// - Fallback when Redis connection fails at startup
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_url(&self, _short_code: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_url(
        &self,
        _short_code: &str,
        _destination_url: &str,
        _ttl: Option<u64>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn invalidate(&self, _short_code: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn record_activity(
        &self,
        _short_code: &str,
        _kind: EventKind,
        _occurred_at: DateTime<Utc>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn read_activity(&self, _short_code: &str) -> CacheResult<Option<ActivityCounters>> {
        Ok(None)
    }

    async fn read_aggregates(&self, _short_code: &str) -> CacheResult<Option<CachedAggregates>> {
        Ok(None)
    }

    async fn write_aggregates(
        &self,
        _short_code: &str,
        _aggregates: &CachedAggregates,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
