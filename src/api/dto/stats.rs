//! DTOs for the bulk click-count endpoint.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Request for approximate click counts of several short codes at once.
#[derive(Debug, Deserialize, Validate)]
pub struct StatsRequest {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 codes per request"))]
    pub short_codes: Vec<String>,
}

/// Click counts keyed by short code.
///
/// Codes the cache counters know are served from there; the rest come from
/// the durable log. Unknown codes report zero rather than erroring, so one
/// bad code never fails the batch.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub counts: HashMap<String, i64>,
}
