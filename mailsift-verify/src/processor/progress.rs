use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::types::{Classification, ClassifiedRecord, Progress};

/// Receives a notification each time an address resolves.
///
/// Called from the batch task, never mid-attempt, so implementations should
/// return quickly.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: Progress, record: &ClassifiedRecord);
}

/// Discards all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _progress: Progress, _record: &ClassifiedRecord) {}
}

/// One resolved address, as forwarded to a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    pub progress: Progress,
    pub address: String,
    pub classification: Classification,
    pub reason: String,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(progress: Progress, record: &ClassifiedRecord) -> Self {
        Self {
            progress,
            address: record.address.clone(),
            classification: record.classification,
            reason: record.reason.clone(),
        }
    }
}

/// Forwards every update; a closed receiver is ignored, the batch carries on
/// until its cancellation token says otherwise.
impl ProgressObserver for UnboundedSender<ProgressUpdate> {
    fn on_progress(&self, progress: Progress, record: &ClassifiedRecord) {
        let _ = self.send(ProgressUpdate::new(progress, record));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_observer_forwards_updates() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let record = ClassifiedRecord {
            address: "a@test.com".to_string(),
            classification: Classification::Undeliverable,
            reason: "risky".to_string(),
            attempts: 1,
        };

        tx.on_progress(
            Progress {
                processed: 1,
                total: 2,
            },
            &record,
        );

        let update = rx.try_recv().unwrap();
        assert_eq!(update.address, "a@test.com");
        assert_eq!(update.progress.percentage(), 50);
        assert_eq!(update.reason, "risky");
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<ProgressUpdate>();
        drop(rx);

        tx.on_progress(
            Progress {
                processed: 1,
                total: 1,
            },
            &ClassifiedRecord {
                address: "a@test.com".to_string(),
                classification: Classification::Deliverable,
                reason: String::new(),
                attempts: 1,
            },
        );
    }
}
