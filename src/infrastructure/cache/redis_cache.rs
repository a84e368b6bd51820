//! Redis-backed cache implementation.

use super::service::{
    ActivityCounters, CacheError, CacheResult, CacheService, CachedAggregates,
};
use crate::domain::entities::EventKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// Redis cache implementation backing all three cache roles.
///
/// Key layout: `url:{code}` holds the redirect mapping (plain string with
/// TTL), `metrics:{code}` the counter hash, `analytics:{code}` the
/// aggregation hash. Uses connection pooling via `ConnectionManager`.
/// All operations are fail-open: errors are logged but don't propagate.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
}

const URL_PREFIX: &str = "url:";
const METRICS_PREFIX: &str = "metrics:";
const ANALYTICS_PREFIX: &str = "analytics:";

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl_seconds` - TTL applied to cached URL mappings when
    ///   [`CacheService::set_url`] is called with `ttl_seconds = None`;
    ///   controlled via `CACHE_TTL_SECONDS` env var
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
        })
    }
}

fn parse_timestamp(value: Option<&String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        let key = format!("{URL_PREFIX}{short_code}");
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(url)) => {
                debug!("Cache HIT: {} -> {}", short_code, url);
                Ok(Some(url))
            }
            Ok(None) => {
                debug!("Cache MISS: {}", short_code);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", short_code, e);
                Ok(None)
            }
        }
    }

    async fn set_url(
        &self,
        short_code: &str,
        destination_url: &str,
        ttl: Option<u64>,
    ) -> CacheResult<()> {
        let key = format!("{URL_PREFIX}{short_code}");
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.unwrap_or(self.default_ttl);

        match conn
            .set_ex::<_, _, ()>(&key, destination_url, ttl_seconds)
            .await
        {
            Ok(_) => {
                debug!(
                    "Cache SET: {} -> {} (TTL: {}s)",
                    short_code, destination_url, ttl_seconds
                );
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", short_code, e);
                Ok(())
            }
        }
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        let key = format!("{URL_PREFIX}{short_code}");
        let mut conn = self.client.clone();

        match conn.del::<_, i32>(&key).await {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!("Cache INVALIDATE: {}", short_code);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Redis DEL error for {}: {}", short_code, e);
                Ok(())
            }
        }
    }

    async fn record_activity(
        &self,
        short_code: &str,
        kind: EventKind,
        occurred_at: DateTime<Utc>,
    ) -> CacheResult<()> {
        let key = format!("{METRICS_PREFIX}{short_code}");
        let mut conn = self.client.clone();

        // HINCRBY is atomic server-side; no read-modify-write race between
        // concurrent ingestions of the same code.
        let mut pipe = redis::pipe();
        pipe.hincr(&key, "total_activities", 1).ignore();
        if kind == EventKind::Click {
            pipe.hincr(&key, "clicks", 1).ignore();
        }
        pipe.hset(&key, "last_activity", occurred_at.to_rfc3339())
            .ignore();

        if let Err(e) = pipe.query_async::<()>(&mut conn).await {
            warn!("Redis counter update error for {}: {}", short_code, e);
        }
        Ok(())
    }

    async fn read_activity(&self, short_code: &str) -> CacheResult<Option<ActivityCounters>> {
        let key = format!("{METRICS_PREFIX}{short_code}");
        let mut conn = self.client.clone();

        let fields: HashMap<String, String> = match conn.hgetall(&key).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Redis HGETALL error for {}: {}", short_code, e);
                return Ok(None);
            }
        };

        if fields.is_empty() {
            return Ok(None);
        }

        Ok(Some(ActivityCounters {
            clicks: fields
                .get("clicks")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            total_activities: fields
                .get("total_activities")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            last_activity: parse_timestamp(fields.get("last_activity")),
        }))
    }

    async fn read_aggregates(&self, short_code: &str) -> CacheResult<Option<CachedAggregates>> {
        let key = format!("{ANALYTICS_PREFIX}{short_code}");
        let mut conn = self.client.clone();

        let fields: HashMap<String, String> = match conn.hgetall(&key).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!("Redis HGETALL error for {}: {}", short_code, e);
                return Ok(None);
            }
        };

        let last_updated = match parse_timestamp(fields.get("last_updated")) {
            Some(ts) => ts,
            None => return Ok(None),
        };

        // Incomplete entries (e.g. a half-written hash) are treated as absent.
        match (
            fields.get("overview"),
            fields.get("timeline"),
            fields.get("referrers"),
            fields.get("location"),
        ) {
            (Some(overview), Some(timeline), Some(referrers), Some(location)) => {
                Ok(Some(CachedAggregates {
                    last_updated,
                    overview: overview.clone(),
                    timeline: timeline.clone(),
                    referrers: referrers.clone(),
                    location: location.clone(),
                }))
            }
            _ => Ok(None),
        }
    }

    async fn write_aggregates(
        &self,
        short_code: &str,
        aggregates: &CachedAggregates,
    ) -> CacheResult<()> {
        let key = format!("{ANALYTICS_PREFIX}{short_code}");
        let mut conn = self.client.clone();

        let fields = [
            ("last_updated", aggregates.last_updated.to_rfc3339()),
            ("overview", aggregates.overview.clone()),
            ("timeline", aggregates.timeline.clone()),
            ("referrers", aggregates.referrers.clone()),
            ("location", aggregates.location.clone()),
        ];

        match conn.hset_multiple::<_, _, _, ()>(&key, &fields).await {
            Ok(_) => {
                debug!("Aggregates cached for {}", short_code);
                Ok(())
            }
            Err(e) => {
                warn!("Redis HSET error for {}: {}", short_code, e);
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
