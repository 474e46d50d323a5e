//! Click event model and the bounded queue feeding the click worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};

/// A redirect that should be counted against its link.
///
/// Created in the redirect handler and consumed by
/// [`crate::domain::click_worker::run_click_worker`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub code: String,
    pub clicked_at: DateTime<Utc>,
}

impl ClickEvent {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            clicked_at: Utc::now(),
        }
    }
}

/// Producer side of the click queue.
///
/// Recording is best-effort: no ordering guarantee and no backpressure. When
/// the queue is full or the worker is gone the event is dropped and counted
/// in [`ClickSender::dropped`] and the `clicks_dropped_total` metric.
#[derive(Debug, Clone)]
pub struct ClickSender {
    tx: mpsc::Sender<ClickEvent>,
    dropped: Arc<AtomicU64>,
}

impl ClickSender {
    /// Creates a queue holding at most `capacity` pending events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ClickEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        let sender = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (sender, rx)
    }

    /// Enqueues `event` without waiting. Returns `false` if it was dropped.
    pub fn record(&self, event: ClickEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                self.note_drop();
                tracing::debug!("Click queue full, dropping click for {}", event.code);
                false
            }
            Err(TrySendError::Closed(event)) => {
                self.note_drop();
                tracing::warn!("Click queue closed, dropping click for {}", event.code);
                false
            }
        }
    }

    /// Total number of events dropped since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Free slots in the queue.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn note_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("clicks_dropped_total").increment(1);
    }
}
