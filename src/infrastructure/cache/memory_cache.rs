//! In-process cache implementation backed by concurrent hash maps.

use super::service::{
    ActivityCounters, CacheResult, CacheService, CachedAggregates,
};
use crate::domain::entities::EventKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// A process-local [`CacheService`] implementation.
///
/// Backs integration tests and single-instance deployments without Redis.
/// TTLs on URL mappings are ignored: absence only triggers a store lookup,
/// so expiry is an operational bound, not a correctness requirement.
#[derive(Default)]
pub struct MemoryCache {
    urls: DashMap<String, String>,
    counters: DashMap<String, ActivityCounters>,
    aggregates: DashMap<String, CachedAggregates>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        Ok(self.urls.get(short_code).map(|v| v.clone()))
    }

    async fn set_url(
        &self,
        short_code: &str,
        destination_url: &str,
        _ttl: Option<u64>,
    ) -> CacheResult<()> {
        self.urls
            .insert(short_code.to_string(), destination_url.to_string());
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        self.urls.remove(short_code);
        Ok(())
    }

    async fn record_activity(
        &self,
        short_code: &str,
        kind: EventKind,
        occurred_at: DateTime<Utc>,
    ) -> CacheResult<()> {
        // The entry guard serializes concurrent updates to the same code.
        let mut entry = self
            .counters
            .entry(short_code.to_string())
            .or_insert_with(|| ActivityCounters {
                clicks: 0,
                total_activities: 0,
                last_activity: None,
            });
        entry.total_activities += 1;
        if kind == EventKind::Click {
            entry.clicks += 1;
        }
        entry.last_activity = Some(occurred_at);
        Ok(())
    }

    async fn read_activity(&self, short_code: &str) -> CacheResult<Option<ActivityCounters>> {
        Ok(self.counters.get(short_code).map(|v| v.clone()))
    }

    async fn read_aggregates(&self, short_code: &str) -> CacheResult<Option<CachedAggregates>> {
        Ok(self.aggregates.get(short_code).map(|v| v.clone()))
    }

    async fn write_aggregates(
        &self,
        short_code: &str,
        aggregates: &CachedAggregates,
    ) -> CacheResult<()> {
        self.aggregates
            .insert(short_code.to_string(), aggregates.clone());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_url_round_trip_and_invalidate() {
        let cache = MemoryCache::new();

        cache
            .set_url("abc1234", "https://example.com", None)
            .await
            .unwrap();
        assert_eq!(
            cache.get_url("abc1234").await.unwrap(),
            Some("https://example.com".to_string())
        );

        cache.invalidate("abc1234").await.unwrap();
        assert_eq!(cache.get_url("abc1234").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_record_activity_counts_clicks_and_scans() {
        let cache = MemoryCache::new();
        let now = Utc::now();

        cache
            .record_activity("abc1234", EventKind::Click, now)
            .await
            .unwrap();
        cache
            .record_activity("abc1234", EventKind::Scan, now)
            .await
            .unwrap();

        let counters = cache.read_activity("abc1234").await.unwrap().unwrap();
        assert_eq!(counters.clicks, 1);
        assert_eq!(counters.total_activities, 2);
        assert_eq!(counters.last_activity, Some(now));
    }

    #[tokio::test]
    async fn test_read_activity_absent_code() {
        let cache = MemoryCache::new();
        assert!(cache.read_activity("missing").await.unwrap().is_none());
    }
}
