//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL link with metadata.
///
/// Represents the mapping between a short code and a destination URL.
/// The short code is globally unique and immutable after creation.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub destination_url: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub has_qr: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

impl Link {
    /// Creates a new Link instance.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        short_code: String,
        destination_url: String,
        owner_id: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        has_qr: bool,
        title: Option<String>,
        description: Option<String>,
        thumbnail: Option<String>,
    ) -> Self {
        Self {
            id,
            short_code,
            destination_url,
            owner_id,
            created_at,
            updated_at,
            has_qr,
            title,
            description,
            thumbnail,
        }
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub destination_url: String,
    pub owner_id: Option<String>,
    pub has_qr: bool,
}

/// Preview metadata attached to a link after creation.
///
/// Populated out-of-band (the scraping itself is outside this service);
/// `None` fields clear nothing, they just stay unset.
#[derive(Debug, Clone, Default)]
pub struct LinkPreview {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}
