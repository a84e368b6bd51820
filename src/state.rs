//! Shared application state injected into all handlers.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{AnalyticsService, LinkService};
use crate::domain::visit_event::VisitEvent;
use crate::infrastructure::cache::CacheService;

/// Application state shared across request handlers.
///
/// Cheap to clone; all fields are reference-counted handles.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub cache: Arc<dyn CacheService>,
    /// Producer side of the bounded visit queue drained by the background
    /// ingestion worker.
    pub visit_tx: mpsc::Sender<VisitEvent>,
}

impl AppState {
    pub fn new(
        link_service: Arc<LinkService>,
        analytics_service: Arc<AnalyticsService>,
        cache: Arc<dyn CacheService>,
        visit_tx: mpsc::Sender<VisitEvent>,
    ) -> Self {
        Self {
            link_service,
            analytics_service,
            cache,
            visit_tx,
        }
    }
}
