//! Visit event message for asynchronous ingestion.

use chrono::{DateTime, Utc};

/// An in-memory visit notification passed from the redirect handler to the
/// background worker via a bounded channel.
///
/// Carries the raw request metadata; enrichment (user-agent classification,
/// geo lookup) happens later in the ingestion service so the redirect
/// response is never blocked on it.
///
/// # Usage Flow
///
/// 1. Created in the redirect handler with request metadata
/// 2. Sent to the channel (non-blocking; dropped if the queue is full)
/// 3. Drained by [`crate::domain::visit_worker::run_visit_worker`]
/// 4. Recorded via [`crate::application::services::IngestService`]
#[derive(Debug, Clone)]
pub struct VisitEvent {
    pub short_code: String,
    pub destination_url: String,
    /// Redirect source marker from the query string; `Some("qr")` marks a scan.
    pub reference: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub ip: Option<String>,
}

impl VisitEvent {
    /// Creates a new visit event stamped with the current time.
    pub fn new(
        short_code: String,
        destination_url: String,
        reference: Option<String>,
        ip: Option<String>,
        user_agent: Option<&str>,
        referer: Option<&str>,
    ) -> Self {
        Self {
            short_code,
            destination_url,
            reference,
            occurred_at: Utc::now(),
            ip,
            user_agent: user_agent.map(|s| s.to_string()),
            referer: referer.map(|s| s.to_string()),
        }
    }

    /// Whether this visit came through a QR code.
    pub fn is_scan(&self) -> bool {
        self.reference.as_deref() == Some("qr")
    }
}
