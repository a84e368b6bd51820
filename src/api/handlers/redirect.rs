//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::domain::visit_event::VisitEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Query parameters accepted by the redirect endpoint.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    /// Source marker; `?ref=qr` marks the visit as a QR scan.
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

/// Redirects a short code to its destination URL.
///
/// # Endpoint
///
/// `GET /{code}[?ref=qr]`
///
/// # Request Flow
///
/// 1. Check cache for the destination (hit → no database touch)
/// 2. On cache miss, query the database and repopulate the cache
///    asynchronously
/// 3. Send a visit event to the background worker
/// 4. Return `302 Found`
///
/// # Visit Tracking
///
/// Visit events go to a bounded channel for async processing. A full queue
/// drops the event (fire-and-forget); the redirect itself never waits on
/// analytics.
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    Query(query): Query<RedirectQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let destination_url = state.link_service.resolve(&code).await?;

    let visit = VisitEvent::new(
        code,
        destination_url.clone(),
        query.reference,
        Some(addr.ip().to_string()),
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
        headers.get(header::REFERER).and_then(|v| v.to_str().ok()),
    );

    if state.visit_tx.try_send(visit).is_err() {
        tracing::warn!("visit queue full, dropping event");
    }

    Ok((StatusCode::FOUND, [(header::LOCATION, destination_url)]))
}
