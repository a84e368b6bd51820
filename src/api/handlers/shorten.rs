//! Handler for the link shortening endpoint.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for a destination URL.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "custom_alias": "promo",   // optional
///   "owner_id": "user-42"      // optional
/// }
/// ```
///
/// # Response
///
/// `201 Created` with the stored link:
///
/// ```json
/// {
///   "short_code": "promo",
///   "destination_url": "https://example.com/some/long/path",
///   "created_at": "2026-08-29T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request` - malformed URL or alias
/// - `409 Conflict` - custom alias already taken
/// - `500 Internal Server Error` - code generation exhausted its retries
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create_short_link(payload.url, payload.custom_alias, payload.owner_id)
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}
