//! Visit ingestion service: enrichment, durable append, counter bump.

use std::sync::Arc;

use crate::domain::entities::{EventKind, NewEvent};
use crate::domain::repositories::EventRepository;
use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::infrastructure::geo::GeoLookup;
use crate::utils::user_agent::parse_user_agent;

/// Turns raw visit notifications into durable analytics events.
///
/// Each recorded visit is enriched (user-agent classification, geo lookup),
/// appended to the event log, and then reflected in the fast counters. The
/// durable append is the commit point: counter updates happen after it and
/// never fail the ingestion.
pub struct IngestService {
    event_repository: Arc<dyn EventRepository>,
    cache: Arc<dyn CacheService>,
    geo: Arc<dyn GeoLookup>,
}

impl IngestService {
    pub fn new(
        event_repository: Arc<dyn EventRepository>,
        cache: Arc<dyn CacheService>,
        geo: Arc<dyn GeoLookup>,
    ) -> Self {
        Self {
            event_repository,
            cache,
            geo,
        }
    }

    /// Records one visit.
    ///
    /// Enrichment is best-effort: an unparseable user agent or a failed geo
    /// lookup leaves the corresponding fields empty, never drops the event.
    ///
    /// # Errors
    ///
    /// Only the durable append can fail; the caller (the visit worker)
    /// retries the whole call, which is safe because nothing is persisted
    /// before the append succeeds and the counter bump after it is skipped
    /// only on retried attempts that never reach it.
    pub async fn record(&self, visit: VisitEvent) -> Result<(), AppError> {
        let kind = if visit.is_scan() {
            EventKind::Scan
        } else {
            EventKind::Click
        };

        let (browser, os, device) = parse_user_agent(visit.user_agent.as_deref());

        let geo = match visit.ip.as_deref() {
            Some(ip) => self.geo.lookup(ip).await,
            None => None,
        };
        let geo = geo.unwrap_or_default();

        let event = NewEvent {
            short_code: visit.short_code.clone(),
            kind,
            occurred_at: visit.occurred_at,
            destination_url: visit.destination_url,
            referer: visit.referer,
            ip_address: visit.ip,
            browser,
            os,
            device,
            country: geo.country,
            country_code: geo.country_code,
            region: geo.region,
            city: geo.city,
        };

        self.event_repository.append(event).await?;

        if let Err(e) = self
            .cache
            .record_activity(&visit.short_code, kind, visit.occurred_at)
            .await
        {
            tracing::warn!(short_code = %visit.short_code, error = %e, "failed to bump activity counters");
        }

        tracing::debug!(short_code = %visit.short_code, kind = kind.as_str(), "visit recorded");

        Ok(())
    }
}
