//! Background worker applying click events to the link store.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::LinkRepository;

/// Attempts per event after the first failure.
const MAX_RETRIES: usize = 3;

/// Consumes click events until every sender is dropped.
///
/// Each event increments the link's click counter, retried with jittered
/// exponential backoff. Events that still fail are logged and counted in
/// `clicks_failed_total`; a failure never stops the worker.
pub async fn run_click_worker<L>(mut rx: mpsc::Receiver<ClickEvent>, repository: Arc<L>)
where
    L: LinkRepository + ?Sized,
{
    info!("Click worker started");

    while let Some(event) = rx.recv().await {
        // 10ms, 20ms, 40ms before jitter.
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(5)
            .map(jitter)
            .take(MAX_RETRIES);

        match Retry::spawn(strategy, || repository.increment_clicks(&event.code)).await {
            Ok(true) => debug!("Click recorded for {}", event.code),
            Ok(false) => debug!("Click for unknown code {} ignored", event.code),
            Err(e) => {
                metrics::counter!("clicks_failed_total").increment(1);
                warn!("Failed to record click for {}: {}", event.code, e);
            }
        }
    }

    info!("Click worker stopped");
}
