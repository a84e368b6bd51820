//! Analytics aggregation with a staleness-gated cache.
//!
//! The durable event log is the source of truth; the cache holds a
//! pre-computed snapshot per short code. A request recomputes the snapshot
//! only when the gate says it is stale, otherwise it is served as-is.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::config::TimelineInterval;
use crate::domain::repositories::{EventRepository, Overview, ReferrerCount, TimelineBucket};
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedAggregates};

/// Visit counts rolled up by country, city, and ISO country code.
///
/// Events with no geolocation data land in the `"unknown"` bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationStats {
    pub countries: BTreeMap<String, i64>,
    pub cities: BTreeMap<String, i64>,
    pub country_codes: BTreeMap<String, i64>,
}

/// The full analytics snapshot for one short code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationBundle {
    pub overview: Overview,
    /// Contiguous buckets from the first recorded visit through now,
    /// zero-filled for idle periods.
    pub timeline: Vec<TimelineBucket>,
    pub referrers: Vec<ReferrerCount>,
    pub location: LocationStats,
}

/// Computes and caches analytics snapshots.
///
/// # Staleness Gate
///
/// A cached snapshot is stale when any of these holds:
/// - no cache entry exists (or it fails to decode),
/// - activity was recorded after the snapshot (`last_activity > last_updated`),
/// - the activity counters are missing, so freshness cannot be established,
/// - the snapshot is older than the configured maximum age.
///
/// Concurrent requests for the same stale code may recompute redundantly;
/// that is harmless because every recomputation derives from the same log
/// and the last write wins. With single-flight enabled they are serialized
/// behind a per-code lock instead, trading latency for load.
pub struct AnalyticsService {
    event_repository: Arc<dyn EventRepository>,
    cache: Arc<dyn CacheService>,
    max_age: Duration,
    timeline_interval: TimelineInterval,
    refresh_locks: Option<DashMap<String, Arc<Mutex<()>>>>,
}

impl AnalyticsService {
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        cache: Arc<dyn CacheService>,
        aggregation_interval_minutes: u64,
        timeline_interval: TimelineInterval,
        single_flight: bool,
    ) -> Self {
        Self {
            event_repository,
            cache,
            max_age: Duration::minutes(aggregation_interval_minutes as i64),
            timeline_interval,
            refresh_locks: single_flight.then(DashMap::new),
        }
    }

    /// Returns the analytics snapshot for a short code, recomputing it from
    /// the event log if the cached one is stale.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when a recomputation query fails.
    /// Pure cache failures never error; they read as "stale" and the
    /// snapshot is served straight from the log.
    pub async fn get_analytics(&self, short_code: &str) -> Result<AggregationBundle, AppError> {
        if let Some(bundle) = self.read_fresh(short_code).await {
            return Ok(bundle);
        }

        if let Some(locks) = &self.refresh_locks {
            let lock = locks
                .entry(short_code.to_string())
                .or_default()
                .clone();
            let guard = lock.lock().await;

            // Another request may have refreshed while we waited.
            let result = match self.read_fresh(short_code).await {
                Some(bundle) => Ok(bundle),
                None => self.refresh(short_code).await,
            };

            // Drop the lock entry once no other request holds a clone, so
            // the map doesn't accumulate one entry per code ever refreshed.
            drop(guard);
            drop(lock);
            locks.remove_if(short_code, |_, l| Arc::strong_count(l) == 1);

            result
        } else {
            self.refresh(short_code).await
        }
    }

    /// Approximate click counts for a batch of short codes.
    ///
    /// Served from the fast counters when available; codes the cache has
    /// never counted fall back to an authoritative log query.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] when a fallback log query fails.
    pub async fn click_counts(
        &self,
        short_codes: &[String],
    ) -> Result<HashMap<String, i64>, AppError> {
        let mut counts = HashMap::with_capacity(short_codes.len());

        for code in short_codes {
            let clicks = match self.cache.read_activity(code).await {
                Ok(Some(counters)) => counters.clicks,
                _ => self.event_repository.count_clicks(code).await?,
            };
            counts.insert(code.clone(), clicks);
        }

        Ok(counts)
    }

    /// Reads the cached snapshot and returns it only if the gate says fresh.
    async fn read_fresh(&self, short_code: &str) -> Option<AggregationBundle> {
        let cached = self.cache.read_aggregates(short_code).await.ok()??;

        if Utc::now() - cached.last_updated > self.max_age {
            tracing::debug!(short_code, "cached analytics expired by age");
            return None;
        }

        // Freshness can only be established against the activity counters;
        // if they are missing (never written, or evicted independently of
        // the snapshot) the snapshot is treated as stale.
        match self.cache.read_activity(short_code).await {
            Ok(Some(counters)) => match counters.last_activity {
                Some(last_activity) if last_activity <= cached.last_updated => {}
                _ => {
                    tracing::debug!(short_code, "cached analytics outdated by new activity");
                    return None;
                }
            },
            _ => {
                tracing::debug!(short_code, "no activity counters for cached analytics");
                return None;
            }
        }

        decode_bundle(&cached)
    }

    /// Recomputes the snapshot from the log and writes it back to the cache.
    async fn refresh(&self, short_code: &str) -> Result<AggregationBundle, AppError> {
        let bundle = self.recompute(short_code).await?;

        let entry = encode_bundle(&bundle)?;
        if let Err(e) = self.cache.write_aggregates(short_code, &entry).await {
            tracing::warn!(short_code, error = %e, "failed to cache analytics snapshot");
        }

        tracing::debug!(short_code, "analytics snapshot recomputed");

        Ok(bundle)
    }

    async fn recompute(&self, short_code: &str) -> Result<AggregationBundle, AppError> {
        let overview = self.event_repository.overview(short_code).await?;
        let raw_timeline = self
            .event_repository
            .timeline(short_code, self.timeline_interval)
            .await?;
        let referrers = self.event_repository.referrers(short_code).await?;
        let locations = self.event_repository.locations(short_code).await?;

        Ok(AggregationBundle {
            overview,
            timeline: zero_fill(raw_timeline, self.timeline_interval, Utc::now()),
            referrers,
            location: rollup_locations(locations),
        })
    }
}

fn truncate(ts: DateTime<Utc>, interval: TimelineInterval) -> DateTime<Utc> {
    match interval {
        TimelineInterval::Hour => Utc
            .with_ymd_and_hms(ts.year(), ts.month(), ts.day(), ts.hour(), 0, 0)
            .single()
            .unwrap_or(ts),
        TimelineInterval::Day => Utc
            .with_ymd_and_hms(ts.year(), ts.month(), ts.day(), 0, 0, 0)
            .single()
            .unwrap_or(ts),
    }
}

/// Expands sparse buckets into a contiguous series from the first bucket
/// through `now`, inserting zero-count buckets for idle periods.
///
/// A code with no events yields a single zero bucket at `now`, so consumers
/// always get at least one point.
fn zero_fill(
    buckets: Vec<TimelineBucket>,
    interval: TimelineInterval,
    now: DateTime<Utc>,
) -> Vec<TimelineBucket> {
    let step = match interval {
        TimelineInterval::Hour => Duration::hours(1),
        TimelineInterval::Day => Duration::days(1),
    };
    let end = truncate(now, interval);

    let start = match buckets.first() {
        Some(first) => first.bucket.min(end),
        None => end,
    };

    let counts: HashMap<DateTime<Utc>, i64> =
        buckets.into_iter().map(|b| (b.bucket, b.count)).collect();

    let mut filled = Vec::new();
    let mut bucket = start;
    while bucket <= end {
        filled.push(TimelineBucket {
            bucket,
            count: counts.get(&bucket).copied().unwrap_or(0),
        });
        bucket += step;
    }

    filled
}

fn rollup_locations(
    locations: Vec<crate::domain::repositories::LocationCount>,
) -> LocationStats {
    let mut stats = LocationStats::default();

    for loc in locations {
        let unknown = || "unknown".to_string();
        *stats
            .countries
            .entry(loc.country.unwrap_or_else(unknown))
            .or_default() += loc.count;
        *stats
            .cities
            .entry(loc.city.unwrap_or_else(unknown))
            .or_default() += loc.count;
        *stats
            .country_codes
            .entry(loc.country_code.unwrap_or_else(unknown))
            .or_default() += loc.count;
    }

    stats
}

fn encode<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| {
        AppError::internal(
            "Failed to encode analytics snapshot",
            json!({ "reason": e.to_string() }),
        )
    })
}

fn encode_bundle(bundle: &AggregationBundle) -> Result<CachedAggregates, AppError> {
    Ok(CachedAggregates {
        last_updated: Utc::now(),
        overview: encode(&bundle.overview)?,
        timeline: encode(&bundle.timeline)?,
        referrers: encode(&bundle.referrers)?,
        location: encode(&bundle.location)?,
    })
}

/// Decodes a cached snapshot; any malformed blob reads as a miss so the
/// caller recomputes instead of serving garbage.
fn decode_bundle(cached: &CachedAggregates) -> Option<AggregationBundle> {
    Some(AggregationBundle {
        overview: serde_json::from_str(&cached.overview).ok()?,
        timeline: serde_json::from_str(&cached.timeline).ok()?,
        referrers: serde_json::from_str(&cached.referrers).ok()?,
        location: serde_json::from_str(&cached.location).ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{EventKind, NewEvent};
    use crate::domain::repositories::{LocationCount, MockEventRepository};
    use crate::infrastructure::cache::MemoryCache;
    use crate::infrastructure::persistence::MemoryEventRepository;

    fn event(code: &str, kind: EventKind) -> NewEvent {
        NewEvent {
            short_code: code.to_string(),
            kind,
            occurred_at: Utc::now(),
            destination_url: "https://example.com".to_string(),
            referer: None,
            ip_address: None,
            browser: None,
            os: None,
            device: None,
            country: None,
            country_code: None,
            region: None,
            city: None,
        }
    }

    fn service(
        repo: Arc<dyn EventRepository>,
        cache: Arc<dyn CacheService>,
        single_flight: bool,
    ) -> AnalyticsService {
        AnalyticsService::new(repo, cache, 60, TimelineInterval::Hour, single_flight)
    }

    #[test]
    fn test_zero_fill_empty_yields_single_bucket() {
        let now = Utc::now();
        let filled = zero_fill(Vec::new(), TimelineInterval::Hour, now);

        assert_eq!(filled.len(), 1);
        assert_eq!(filled[0].count, 0);
        assert_eq!(filled[0].bucket, truncate(now, TimelineInterval::Hour));
    }

    #[test]
    fn test_zero_fill_bridges_idle_hours() {
        let now = Utc::now();
        let start = truncate(now, TimelineInterval::Hour) - Duration::hours(3);
        let sparse = vec![
            TimelineBucket { bucket: start, count: 2 },
            TimelineBucket { bucket: start + Duration::hours(2), count: 1 },
        ];

        let filled = zero_fill(sparse, TimelineInterval::Hour, now);

        assert_eq!(filled.len(), 4);
        assert_eq!(filled[0].count, 2);
        assert_eq!(filled[1].count, 0);
        assert_eq!(filled[2].count, 1);
        assert_eq!(filled[3].count, 0);
        for pair in filled.windows(2) {
            assert_eq!(pair[1].bucket - pair[0].bucket, Duration::hours(1));
        }
    }

    #[test]
    fn test_rollup_locations_collapses_missing_into_unknown() {
        let stats = rollup_locations(vec![
            LocationCount {
                country: Some("Germany".to_string()),
                country_code: Some("DE".to_string()),
                city: Some("Berlin".to_string()),
                count: 3,
            },
            LocationCount {
                country: Some("Germany".to_string()),
                country_code: Some("DE".to_string()),
                city: Some("Munich".to_string()),
                count: 1,
            },
            LocationCount {
                country: None,
                country_code: None,
                city: None,
                count: 2,
            },
        ]);

        assert_eq!(stats.countries["Germany"], 4);
        assert_eq!(stats.countries["unknown"], 2);
        assert_eq!(stats.cities["Berlin"], 3);
        assert_eq!(stats.country_codes["DE"], 4);
    }

    #[tokio::test]
    async fn test_get_analytics_recomputes_on_missing_entry() {
        let repo = Arc::new(MemoryEventRepository::new());
        repo.append(event("abc", EventKind::Click)).await.unwrap();
        repo.append(event("abc", EventKind::Scan)).await.unwrap();

        let cache = Arc::new(MemoryCache::new());
        let service = service(repo, cache.clone(), false);

        let bundle = service.get_analytics("abc").await.unwrap();

        assert_eq!(bundle.overview.clicks, 1);
        assert_eq!(bundle.overview.scans, 1);
        assert_eq!(bundle.overview.total_engagement, 2);
        assert!(cache.read_aggregates("abc").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_fresh_snapshot_served_without_recompute() {
        let mut mock_repo = MockEventRepository::new();
        mock_repo
            .expect_overview()
            .times(1)
            .returning(|_| Ok(Overview::default()));
        mock_repo
            .expect_timeline()
            .times(1)
            .returning(|_, _| Ok(Vec::new()));
        mock_repo
            .expect_referrers()
            .times(1)
            .returning(|_| Ok(Vec::new()));
        mock_repo
            .expect_locations()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let cache = Arc::new(MemoryCache::new());
        cache
            .record_activity("abc", EventKind::Click, Utc::now())
            .await
            .unwrap();
        let service = service(Arc::new(mock_repo), cache, false);

        let first = service.get_analytics("abc").await.unwrap();
        // Second call is served from cache; the times(1) expectations above
        // fail the test if it touches the log again.
        let second = service.get_analytics("abc").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_new_activity_invalidates_snapshot() {
        let repo = Arc::new(MemoryEventRepository::new());
        repo.append(event("abc", EventKind::Click)).await.unwrap();

        let cache = Arc::new(MemoryCache::new());
        let service = service(repo.clone(), cache.clone(), false);

        let first = service.get_analytics("abc").await.unwrap();
        assert_eq!(first.overview.total_engagement, 1);

        // A visit lands after the snapshot: bump the counters past it.
        repo.append(event("abc", EventKind::Click)).await.unwrap();
        cache
            .record_activity("abc", EventKind::Click, Utc::now() + Duration::seconds(1))
            .await
            .unwrap();

        let second = service.get_analytics("abc").await.unwrap();
        assert_eq!(second.overview.total_engagement, 2);
    }

    #[tokio::test]
    async fn test_aged_snapshot_is_recomputed() {
        let repo = Arc::new(MemoryEventRepository::new());
        repo.append(event("abc", EventKind::Click)).await.unwrap();

        let cache = Arc::new(MemoryCache::new());
        cache
            .record_activity("abc", EventKind::Click, Utc::now() - Duration::hours(3))
            .await
            .unwrap();

        // Plant a decodable snapshot that claims zero events but is two
        // hours old (the gate allows one hour). The counters predate it, so
        // only its age makes it stale.
        let stale = AggregationBundle {
            overview: Overview::default(),
            timeline: Vec::new(),
            referrers: Vec::new(),
            location: LocationStats::default(),
        };
        let mut entry = encode_bundle(&stale).unwrap();
        entry.last_updated = Utc::now() - Duration::hours(2);
        cache.write_aggregates("abc", &entry).await.unwrap();

        let service = service(repo, cache, false);
        let bundle = service.get_analytics("abc").await.unwrap();

        assert_eq!(bundle.overview.total_engagement, 1);
    }

    #[tokio::test]
    async fn test_undecodable_snapshot_reads_as_stale() {
        let repo = Arc::new(MemoryEventRepository::new());
        repo.append(event("abc", EventKind::Click)).await.unwrap();

        let cache = Arc::new(MemoryCache::new());
        cache
            .record_activity("abc", EventKind::Click, Utc::now() - Duration::seconds(10))
            .await
            .unwrap();
        cache
            .write_aggregates(
                "abc",
                &CachedAggregates {
                    last_updated: Utc::now(),
                    overview: "not json".to_string(),
                    timeline: String::new(),
                    referrers: String::new(),
                    location: String::new(),
                },
            )
            .await
            .unwrap();

        let service = service(repo, cache, false);
        let bundle = service.get_analytics("abc").await.unwrap();

        assert_eq!(bundle.overview.clicks, 1);
    }

    #[tokio::test]
    async fn test_single_flight_mode_returns_same_result() {
        let repo = Arc::new(MemoryEventRepository::new());
        repo.append(event("abc", EventKind::Click)).await.unwrap();

        let cache = Arc::new(MemoryCache::new());
        let service = Arc::new(service(repo, cache, true));

        let (a, b) = tokio::join!(
            service.get_analytics("abc"),
            service.get_analytics("abc")
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert!(service.refresh_locks.as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_flight_lock_map_drains_after_refresh() {
        let repo = Arc::new(MemoryEventRepository::new());
        let cache = Arc::new(MemoryCache::new());
        let service = service(repo, cache, true);

        for i in 0..50 {
            let code = format!("code{i}");
            service.get_analytics(&code).await.unwrap();
        }

        // One-shot refreshes must not leave a lock behind per code.
        assert!(service.refresh_locks.as_ref().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_without_counters_is_recomputed() {
        let repo = Arc::new(MemoryEventRepository::new());
        repo.append(event("abc", EventKind::Click)).await.unwrap();

        let cache = Arc::new(MemoryCache::new());

        // A young, decodable snapshot claiming zero events, with no counter
        // hash alongside it (e.g. the counters were evicted). Without
        // counters freshness cannot be established, so the snapshot must
        // not be served.
        let planted = AggregationBundle {
            overview: Overview::default(),
            timeline: Vec::new(),
            referrers: Vec::new(),
            location: LocationStats::default(),
        };
        cache
            .write_aggregates("abc", &encode_bundle(&planted).unwrap())
            .await
            .unwrap();

        let service = service(repo, cache, false);
        let bundle = service.get_analytics("abc").await.unwrap();

        assert_eq!(bundle.overview.total_engagement, 1);
    }

    #[tokio::test]
    async fn test_click_counts_prefers_counters_with_log_fallback() {
        let repo = Arc::new(MemoryEventRepository::new());
        // "cold" has log entries but no counters (e.g. counters evicted).
        repo.append(event("cold", EventKind::Click)).await.unwrap();
        repo.append(event("cold", EventKind::Click)).await.unwrap();

        let cache = Arc::new(MemoryCache::new());
        cache
            .record_activity("hot", EventKind::Click, Utc::now())
            .await
            .unwrap();

        let service = service(repo, cache, false);
        let counts = service
            .click_counts(&["hot".to_string(), "cold".to_string(), "none".to_string()])
            .await
            .unwrap();

        assert_eq!(counts["hot"], 1);
        assert_eq!(counts["cold"], 2);
        assert_eq!(counts["none"], 0);
    }
}
