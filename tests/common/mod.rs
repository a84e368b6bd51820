#![allow(dead_code)]

use std::sync::Arc;
use tokio::sync::mpsc;

use curtail::application::services::{AnalyticsService, IngestService, LinkService};
use curtail::config::TimelineInterval;
use curtail::domain::entities::NewLink;
use curtail::domain::visit_event::VisitEvent;
use curtail::infrastructure::cache::MemoryCache;
use curtail::infrastructure::geo::NullGeoLookup;
use curtail::infrastructure::persistence::{MemoryEventRepository, MemoryLinkRepository};
use curtail::state::AppState;

/// Everything a handler test needs: the wired state plus direct handles to
/// the in-memory backends for seeding and inspection.
pub struct TestContext {
    pub state: AppState,
    pub visit_rx: mpsc::Receiver<VisitEvent>,
    pub link_repo: Arc<MemoryLinkRepository>,
    pub event_repo: Arc<MemoryEventRepository>,
    pub cache: Arc<MemoryCache>,
    pub ingest: Arc<IngestService>,
}

pub fn create_test_context() -> TestContext {
    let link_repo = Arc::new(MemoryLinkRepository::new());
    let event_repo = Arc::new(MemoryEventRepository::new());
    let cache = Arc::new(MemoryCache::new());

    let (visit_tx, visit_rx) = mpsc::channel(100);

    let link_service = Arc::new(LinkService::new(link_repo.clone(), cache.clone(), 7, 5));
    let analytics_service = Arc::new(AnalyticsService::new(
        event_repo.clone(),
        cache.clone(),
        60,
        TimelineInterval::Hour,
        false,
    ));
    let ingest = Arc::new(IngestService::new(
        event_repo.clone(),
        cache.clone(),
        Arc::new(NullGeoLookup),
    ));

    let state = AppState::new(link_service, analytics_service, cache.clone(), visit_tx);

    TestContext {
        state,
        visit_rx,
        link_repo,
        event_repo,
        cache,
        ingest,
    }
}

pub async fn create_test_link(ctx: &TestContext, code: &str, url: &str) {
    use curtail::domain::repositories::LinkRepository;

    ctx.link_repo
        .create(NewLink {
            short_code: code.to_string(),
            destination_url: url.to_string(),
            owner_id: None,
            has_qr: false,
        })
        .await
        .unwrap();
}

/// Drains every queued visit event through the ingestion service, the way
/// the background worker would.
pub async fn drain_visits(ctx: &mut TestContext) {
    while let Ok(event) = ctx.visit_rx.try_recv() {
        ctx.ingest.record(event).await.unwrap();
    }
}
