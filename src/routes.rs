//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `POST /shorten`           - Create a short link
//! - `GET  /{code}`            - Short link redirect
//! - `GET  /analytics/{code}`  - Full analytics snapshot for a link
//! - `POST /stats`             - Bulk approximate click counts
//! - `GET  /health`            - Health check: DB, cache, visit queue
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling

use crate::api::handlers::{
    analytics_handler, health_handler, redirect_handler, shorten_handler, stats_handler,
};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// The redirect route is registered last so the literal routes
/// (`/shorten`, `/stats`, `/health`) take precedence over `/{code}`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/analytics/{code}", get(analytics_handler))
        .route("/stats", post(stats_handler))
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
