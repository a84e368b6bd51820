//! Handler for the per-link analytics endpoint.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::analytics::AnalyticsResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the full analytics snapshot for a short code.
///
/// # Endpoint
///
/// `GET /analytics/{code}`
///
/// # Freshness
///
/// Served from the cached snapshot when it is still fresh; otherwise
/// recomputed from the event log before responding. See
/// [`crate::application::services::AnalyticsService`] for the gate rules.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn analytics_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    // 404 for unknown codes instead of an empty snapshot.
    state.link_service.get_link(&code).await?;

    let bundle = state.analytics_service.get_analytics(&code).await?;

    Ok(Json(AnalyticsResponse::from_bundle(code, bundle)))
}
