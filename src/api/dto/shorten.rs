//! DTOs for the link shortening endpoint.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::domain::entities::Link;

/// Compiled regex for custom alias validation.
///
/// A coarse shape check; reserved words and edge hyphens are rejected by
/// the service layer.
static CUSTOM_ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("static regex"));

/// Request to shorten a URL.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The destination URL (must be valid HTTP/HTTPS).
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    /// Optional caller-chosen short code instead of a generated one.
    #[validate(length(min = 3, max = 32))]
    #[validate(regex(path = "*CUSTOM_ALIAS_REGEX"))]
    pub custom_alias: Option<String>,

    /// Optional owner identifier recorded with the link.
    pub owner_id: Option<String>,
}

/// Response for a successfully created short link.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub destination_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Link> for ShortenResponse {
    fn from(link: Link) -> Self {
        Self {
            short_code: link.short_code,
            destination_url: link.destination_url,
            created_at: link.created_at,
        }
    }
}
