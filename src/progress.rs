//! Progress reporting
//!
//! The coordinator publishes [`ProgressEvent`]s on a bounded channel. Sending
//! never blocks: when the channel is full or the receiver is gone the event is
//! dropped. A consumer either drains the channel itself or hands a callback to
//! [`spawn_observer`].

use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// Coarse crawl stage reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Init,
    Discovery,
    ScrapingProducts,
    Saving,
    Complete,
    Error,
}

/// A single progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    pub message: String,
    pub current: usize,
    pub total: usize,
    /// Whole percent, 0 to 100
    pub percentage: u8,
    pub products_found: usize,
}

impl ProgressEvent {
    /// Builds an event, deriving the percentage from `current / total`
    pub fn new(
        stage: ProgressStage,
        message: impl Into<String>,
        current: usize,
        total: usize,
        products_found: usize,
    ) -> Self {
        let percentage = match stage {
            ProgressStage::Complete => 100,
            _ if total == 0 => 0,
            // Clamped to total, so the quotient never exceeds 100
            _ => (current.min(total) * 100 / total) as u8,
        };

        Self {
            stage,
            message: message.into(),
            current,
            total,
            percentage,
            products_found,
        }
    }
}

/// Non-blocking sending half of the progress channel
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn new(sender: mpsc::Sender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A reporter that discards every event
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Publishes an event without waiting
    ///
    /// Returns true when the event was queued.
    pub fn report(&self, event: ProgressEvent) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };

        match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::debug!("Progress channel full, dropping {:?} event", event.stage);
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("Progress receiver closed");
                false
            }
        }
    }
}

/// Consumer of progress events
pub trait ProgressObserver: Send + 'static {
    fn on_progress(&mut self, event: &ProgressEvent) -> anyhow::Result<()>;
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressEvent) -> anyhow::Result<()> + Send + 'static,
{
    fn on_progress(&mut self, event: &ProgressEvent) -> anyhow::Result<()> {
        self(event)
    }
}

/// Drives an observer from the receiving half of a progress channel
///
/// The task ends when every sender has been dropped. Observer errors are
/// logged, and a panicking observer only loses the event it panicked on.
///
/// # Returns
///
/// The number of events the observer handled successfully.
pub fn spawn_observer<O>(
    mut rx: mpsc::Receiver<ProgressEvent>,
    mut observer: O,
) -> JoinHandle<usize>
where
    O: ProgressObserver,
{
    tokio::spawn(async move {
        let mut handled = 0;

        while let Some(event) = rx.recv().await {
            match catch_unwind(AssertUnwindSafe(|| observer.on_progress(&event))) {
                Ok(Ok(())) => handled += 1,
                Ok(Err(e)) => tracing::warn!("Progress observer failed: {:#}", e),
                Err(_) => tracing::error!("Progress observer panicked on {:?} event", event.stage),
            }
        }

        handled
    })
}
