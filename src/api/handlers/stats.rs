//! Handler for the bulk click-count endpoint.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::stats::{StatsRequest, StatsResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Returns approximate click counts for a batch of short codes.
///
/// # Endpoint
///
/// `POST /stats`
///
/// # Request Body
///
/// ```json
/// { "short_codes": ["abc1234", "promo"] }
/// ```
///
/// # Response
///
/// ```json
/// { "counts": { "abc1234": 17, "promo": 3 } }
/// ```
///
/// Counts come from the fast cache counters when available, falling back
/// to the durable log per code. Unknown codes report zero.
///
/// # Errors
///
/// Returns 400 Bad Request for an empty or oversized batch.
pub async fn stats_handler(
    State(state): State<AppState>,
    Json(payload): Json<StatsRequest>,
) -> Result<Json<StatsResponse>, AppError> {
    payload.validate()?;

    let counts = state
        .analytics_service
        .click_counts(&payload.short_codes)
        .await?;

    Ok(Json(StatsResponse { counts }))
}
