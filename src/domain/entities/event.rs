//! Visit event entity: one durable record per observed click or scan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a visit came from a plain link click or a QR code scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Click,
    Scan,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Scan => "scan",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "click" => Some(Self::Click),
            "scan" => Some(Self::Scan),
            _ => None,
        }
    }
}

/// Input data for appending a visit event to the durable log.
///
/// Append-only: events are never updated or deleted by this service.
/// Enrichment fields are optional; a failed user-agent parse or geo lookup
/// leaves them unset rather than blocking ingestion.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub short_code: String,
    pub kind: EventKind,
    pub occurred_at: DateTime<Utc>,
    pub destination_url: String,
    pub referer: Option<String>,
    pub ip_address: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_event_kind_round_trip() {
        assert_eq!(EventKind::parse("click"), Some(EventKind::Click));
        assert_eq!(EventKind::parse("scan"), Some(EventKind::Scan));
        assert_eq!(EventKind::parse("view"), None);
        assert_eq!(EventKind::Click.as_str(), "click");
        assert_eq!(EventKind::Scan.as_str(), "scan");
    }

    #[test]
    fn test_new_event_minimal() {
        let event = NewEvent {
            short_code: "abc1234".to_string(),
            kind: EventKind::Click,
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
        };

        assert_eq!(event.kind, EventKind::Click);
        assert!(event.referer.is_none());
        assert!(event.city.is_none());
    }
}
