//! DTOs for the analytics endpoint.

use serde::Serialize;

use crate::application::services::{AggregationBundle, LocationStats};
use crate::domain::repositories::{Overview, ReferrerCount, TimelineBucket};

/// Full analytics snapshot for one short code.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub short_code: String,
    pub overview: Overview,
    pub timeline: Vec<TimelineBucket>,
    pub referrers: Vec<ReferrerCount>,
    pub location: LocationStats,
}

impl AnalyticsResponse {
    pub fn from_bundle(short_code: String, bundle: AggregationBundle) -> Self {
        Self {
            short_code,
            overview: bundle.overview,
            timeline: bundle.timeline,
            referrers: bundle.referrers,
            location: bundle.location,
        }
    }
}
