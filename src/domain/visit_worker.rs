//! Background worker draining the visit-event queue into the ingestion service.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::application::services::IngestService;
use crate::domain::visit_event::VisitEvent;

/// Runs the visit worker until the sending side of the channel is dropped.
///
/// Each event is recorded through [`IngestService::record`]; transient
/// failures are retried with exponential backoff before the event is
/// dropped. Delivery is at-least-once from the caller's perspective, so a
/// retried duplicate only inflates the advisory counters slightly.
pub async fn run_visit_worker(mut rx: mpsc::Receiver<VisitEvent>, ingest: Arc<IngestService>) {
    while let Some(event) = rx.recv().await {
        let strategy = ExponentialBackoff::from_millis(50)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(3);

        let result = Retry::start(strategy, || {
            let event = event.clone();
            let ingest = ingest.clone();
            async move { ingest.record(event).await }
        })
        .await;

        if let Err(e) = result {
            tracing::error!(
                short_code = %event.short_code,
                error = %e,
                "dropping visit event after retries"
            );
        }
    }

    tracing::info!("visit worker shutting down: channel closed");
}
