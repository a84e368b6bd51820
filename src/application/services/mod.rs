//! Application services orchestrating repositories, cache, and enrichment.

mod analytics_service;
mod ingest_service;
mod link_service;

pub use analytics_service::{AggregationBundle, AnalyticsService, LocationStats};
pub use ingest_service::IngestService;
pub use link_service::LinkService;
