use std::sync::Arc;

use mailsift_verify::{BatchProcessor, Summary};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

/// Shared by every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    processor: BatchProcessor,
    last_completed: Arc<RwLock<Option<Arc<Summary>>>>,
    shutdown: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(processor: BatchProcessor) -> Self {
        Self {
            processor,
            last_completed: Arc::default(),
            shutdown: CancellationToken::new(),
        }
    }

    #[must_use]
    pub const fn processor(&self) -> &BatchProcessor {
        &self.processor
    }

    /// Token for one batch. Cancelled when the server shuts down.
    #[must_use]
    pub fn batch_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Cancel every running batch
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Summary of the most recent batch that ran to completion
    #[must_use]
    pub fn last_completed(&self) -> Option<Arc<Summary>> {
        self.last_completed.read().clone()
    }

    /// Remember `summary` for the download endpoints if the batch completed.
    pub fn record(&self, summary: &Summary) {
        if summary.is_complete() {
            *self.last_completed.write() = Some(Arc::new(summary.clone()));
        }
    }
}
