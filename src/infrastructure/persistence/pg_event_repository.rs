//! PostgreSQL implementation of the visit-event repository.
//!
//! The aggregation queries mirror the four analytics groupings: overview,
//! timeline, referrers, and locations. All of them re-derive from the full
//! event log; the cached counters are never consulted here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::TimelineInterval;
use crate::domain::entities::NewEvent;
use crate::domain::repositories::{
    EventRepository, LocationCount, Overview, ReferrerCount, TimelineBucket,
};
use crate::error::AppError;

/// PostgreSQL repository for the append-only event log.
pub struct PgEventRepository {
    pool: Arc<PgPool>,
}

impl PgEventRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OverviewRow {
    clicks: i64,
    scans: i64,
    last_activity: Option<DateTime<Utc>>,
    total_engagement: i64,
}

#[derive(sqlx::FromRow)]
struct TimelineRow {
    bucket: DateTime<Utc>,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct ReferrerRow {
    referer: String,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    country: Option<String>,
    country_code: Option<String>,
    city: Option<String>,
    count: i64,
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn append(&self, event: NewEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO link_events (
                short_code, kind, occurred_at, destination_url, referer,
                ip_address, browser, os, device,
                country, country_code, region, city
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&event.short_code)
        .bind(event.kind.as_str())
        .bind(event.occurred_at)
        .bind(&event.destination_url)
        .bind(&event.referer)
        .bind(&event.ip_address)
        .bind(&event.browser)
        .bind(&event.os)
        .bind(&event.device)
        .bind(&event.country)
        .bind(&event.country_code)
        .bind(&event.region)
        .bind(&event.city)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn overview(&self, short_code: &str) -> Result<Overview, AppError> {
        let row: OverviewRow = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE kind = 'click') AS clicks,
                COUNT(*) FILTER (WHERE kind = 'scan') AS scans,
                MAX(occurred_at) AS last_activity,
                COUNT(*) AS total_engagement
            FROM link_events
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(Overview {
            clicks: row.clicks,
            scans: row.scans,
            last_activity: row.last_activity,
            total_engagement: row.total_engagement,
        })
    }

    async fn timeline(
        &self,
        short_code: &str,
        interval: TimelineInterval,
    ) -> Result<Vec<TimelineBucket>, AppError> {
        let unit = match interval {
            TimelineInterval::Hour => "hour",
            TimelineInterval::Day => "day",
        };

        let rows: Vec<TimelineRow> = sqlx::query_as(
            r#"
            SELECT date_trunc($2, occurred_at) AS bucket, COUNT(*) AS count
            FROM link_events
            WHERE short_code = $1
            GROUP BY bucket
            ORDER BY bucket
            "#,
        )
        .bind(short_code)
        .bind(unit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TimelineBucket {
                bucket: r.bucket,
                count: r.count,
            })
            .collect())
    }

    async fn referrers(&self, short_code: &str) -> Result<Vec<ReferrerCount>, AppError> {
        // NULL and empty referers collapse into the "direct" bucket at
        // grouping time; raw events keep their original value.
        let rows: Vec<ReferrerRow> = sqlx::query_as(
            r#"
            SELECT COALESCE(NULLIF(referer, ''), 'direct') AS referer, COUNT(*) AS count
            FROM link_events
            WHERE short_code = $1
            GROUP BY 1
            ORDER BY count DESC
            "#,
        )
        .bind(short_code)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ReferrerCount {
                referer: r.referer,
                count: r.count,
            })
            .collect())
    }

    async fn locations(&self, short_code: &str) -> Result<Vec<LocationCount>, AppError> {
        let rows: Vec<LocationRow> = sqlx::query_as(
            r#"
            SELECT country, country_code, city, COUNT(*) AS count
            FROM link_events
            WHERE short_code = $1
            GROUP BY country, country_code, city
            ORDER BY count DESC
            "#,
        )
        .bind(short_code)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LocationCount {
                country: r.country,
                country_code: r.country_code,
                city: r.city,
                count: r.count,
            })
            .collect())
    }

    async fn count_clicks(&self, short_code: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM link_events WHERE short_code = $1 AND kind = 'click'",
        )
        .bind(short_code)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }
}
