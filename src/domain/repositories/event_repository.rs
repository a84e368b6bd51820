//! Repository trait for the durable visit-event log and its grouping queries.

use crate::config::TimelineInterval;
use crate::domain::entities::NewEvent;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Click/scan totals for one short code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub clicks: i64,
    pub scans: i64,
    pub last_activity: Option<DateTime<Utc>>,
    pub total_engagement: i64,
}

/// One calendar bucket of the activity timeline.
///
/// `bucket` is the truncated start of the hour/day in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineBucket {
    pub bucket: DateTime<Utc>,
    pub count: i64,
}

/// Visit count per referrer.
///
/// Missing and empty referers are collapsed into the `"direct"` bucket by
/// the repository, so consumers never see a null referrer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferrerCount {
    pub referer: String,
    pub count: i64,
}

/// Visit count per (country, city) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCount {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub count: i64,
}

/// Repository interface for the append-only visit-event log.
///
/// `append` is the only write; the grouping queries feed the aggregator and
/// always re-derive from the full log (the cached counters are advisory).
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgEventRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryEventRepository`] - in-memory implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Appends one visit event to the durable log.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn append(&self, event: NewEvent) -> Result<(), AppError>;

    /// Click/scan totals and the most recent activity timestamp.
    ///
    /// Returns a zeroed [`Overview`] when the code has no events.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn overview(&self, short_code: &str) -> Result<Overview, AppError>;

    /// Visit counts bucketed by calendar unit, sorted ascending.
    ///
    /// Only buckets with activity are returned; zero-filling across the
    /// queried range is the aggregator's job.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn timeline(
        &self,
        short_code: &str,
        interval: TimelineInterval,
    ) -> Result<Vec<TimelineBucket>, AppError>;

    /// Visit counts grouped by referrer, most frequent first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn referrers(&self, short_code: &str) -> Result<Vec<ReferrerCount>, AppError>;

    /// Visit counts grouped by country/city.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn locations(&self, short_code: &str) -> Result<Vec<LocationCount>, AppError>;

    /// Authoritative click count for one code, derived from the log.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_clicks(&self, short_code: &str) -> Result<i64, AppError>;
}
