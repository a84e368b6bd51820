//! In-memory repository implementations.
//!
//! Mirror the Postgres semantics closely enough to back integration tests
//! without a database: unique short codes, append-only events, and the same
//! four grouping queries.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::config::TimelineInterval;
use crate::domain::entities::{EventKind, Link, LinkPreview, NewLink};
use crate::domain::repositories::{
    EventRepository, LinkRepository, LocationCount, Overview, ReferrerCount, TimelineBucket,
};
use crate::error::AppError;
use serde_json::json;

/// In-memory [`LinkRepository`] with a unique-code constraint.
#[derive(Default)]
pub struct MemoryLinkRepository {
    links: DashMap<String, Link>,
    next_id: AtomicI64,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let now = Utc::now();
        let link = Link::new(
            self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            new_link.short_code.clone(),
            new_link.destination_url,
            new_link.owner_id,
            now,
            now,
            new_link.has_qr,
            None,
            None,
            None,
        );

        // entry() makes the uniqueness check and insert a single atomic step,
        // like the unique index does in Postgres.
        match self.links.entry(new_link.short_code.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "short_code": new_link.short_code }),
            )),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(link.clone());
                Ok(link)
            }
        }
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<Link>, AppError> {
        Ok(self.links.get(short_code).map(|l| l.clone()))
    }

    async fn exists(&self, short_code: &str) -> Result<bool, AppError> {
        Ok(self.links.contains_key(short_code))
    }

    async fn set_preview(&self, short_code: &str, preview: LinkPreview) -> Result<(), AppError> {
        match self.links.get_mut(short_code) {
            Some(mut link) => {
                if preview.title.is_some() {
                    link.title = preview.title;
                }
                if preview.description.is_some() {
                    link.description = preview.description;
                }
                if preview.thumbnail.is_some() {
                    link.thumbnail = preview.thumbnail;
                }
                link.updated_at = Utc::now();
                Ok(())
            }
            None => Err(AppError::not_found(
                "Short link not found",
                json!({ "short_code": short_code }),
            )),
        }
    }
}

/// In-memory append-only [`EventRepository`].
#[derive(Default)]
pub struct MemoryEventRepository {
    events: Mutex<Vec<crate::domain::entities::NewEvent>>,
}

impl MemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn for_code(&self, short_code: &str) -> Vec<crate::domain::entities::NewEvent> {
        self.events
            .lock()
            .expect("event log lock poisoned")
            .iter()
            .filter(|e| e.short_code == short_code)
            .cloned()
            .collect()
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

#[async_trait]
impl EventRepository for MemoryEventRepository {
    async fn append(&self, event: crate::domain::entities::NewEvent) -> Result<(), AppError> {
        self.events
            .lock()
            .expect("event log lock poisoned")
            .push(event);
        Ok(())
    }

    async fn overview(&self, short_code: &str) -> Result<Overview, AppError> {
        let events = self.for_code(short_code);

        Ok(Overview {
            clicks: events.iter().filter(|e| e.kind == EventKind::Click).count() as i64,
            scans: events.iter().filter(|e| e.kind == EventKind::Scan).count() as i64,
            last_activity: events.iter().map(|e| e.occurred_at).max(),
            total_engagement: events.len() as i64,
        })
    }

    async fn timeline(
        &self,
        short_code: &str,
        interval: TimelineInterval,
    ) -> Result<Vec<TimelineBucket>, AppError> {
        let mut buckets: HashMap<DateTime<Utc>, i64> = HashMap::new();
        for event in self.for_code(short_code) {
            *buckets.entry(truncate(event.occurred_at, interval)).or_default() += 1;
        }

        let mut timeline: Vec<TimelineBucket> = buckets
            .into_iter()
            .map(|(bucket, count)| TimelineBucket { bucket, count })
            .collect();
        timeline.sort_by_key(|b| b.bucket);
        Ok(timeline)
    }

    async fn referrers(&self, short_code: &str) -> Result<Vec<ReferrerCount>, AppError> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for event in self.for_code(short_code) {
            let referer = match event.referer.as_deref() {
                None | Some("") => "direct".to_string(),
                Some(r) => r.to_string(),
            };
            *counts.entry(referer).or_default() += 1;
        }

        let mut referrers: Vec<ReferrerCount> = counts
            .into_iter()
            .map(|(referer, count)| ReferrerCount { referer, count })
            .collect();
        referrers.sort_by(|a, b| b.count.cmp(&a.count).then(a.referer.cmp(&b.referer)));
        Ok(referrers)
    }

    async fn locations(&self, short_code: &str) -> Result<Vec<LocationCount>, AppError> {
        type LocationKey = (Option<String>, Option<String>, Option<String>);
        let mut counts: HashMap<LocationKey, i64> = HashMap::new();
        for event in self.for_code(short_code) {
            let key = (event.country, event.country_code, event.city);
            *counts.entry(key).or_default() += 1;
        }

        let mut locations: Vec<LocationCount> = counts
            .into_iter()
            .map(|((country, country_code, city), count)| LocationCount {
                country,
                country_code,
                city,
                count,
            })
            .collect();
        locations.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(locations)
    }

    async fn count_clicks(&self, short_code: &str) -> Result<i64, AppError> {
        Ok(self
            .for_code(short_code)
            .iter()
            .filter(|e| e.kind == EventKind::Click)
            .count() as i64)
    }
}
