//! Batch processing
//!
//! Addresses are driven one at a time through the well-formedness check, the
//! [`VerificationClient`] and the classifier. Address `i + 1` is never
//! dispatched before address `i` resolves, so records come out in input order.
//!
//! The run ends early on two conditions:
//! - a [`FatalError`](crate::error::FatalError) from the client: the batch is
//!   [`BatchStatus::Aborted`] with the records resolved so far
//! - the cancellation token firing: the batch is [`BatchStatus::Cancelled`]
//!
//! Unreached addresses are counted, never recorded.

mod progress;

use mailsift_common::{
    Address, internal,
    tracing::{debug, info, warn},
};
use tokio_util::sync::CancellationToken;

pub use self::progress::{NoProgress, ProgressObserver, ProgressUpdate};
use crate::{
    classifier::classify,
    client::{ClientOutcome, VerificationClient},
    types::{BatchResult, BatchStatus, ClassifiedRecord, Progress, Verdict},
};

/// Runs whole batches against a shared [`VerificationClient`]
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    client: VerificationClient,
}

impl BatchProcessor {
    #[must_use]
    pub const fn new(client: VerificationClient) -> Self {
        Self { client }
    }

    /// Verify and classify every address in `addresses`, in order.
    ///
    /// `observer` is told about each address as it resolves. `cancel` is
    /// checked between addresses and observed by the client while it waits.
    pub async fn process<S, O>(
        &self,
        addresses: &[S],
        observer: &O,
        cancel: &CancellationToken,
    ) -> BatchResult
    where
        S: AsRef<str> + Sync,
        O: ProgressObserver + ?Sized,
    {
        let total = addresses.len();
        let mut records: Vec<ClassifiedRecord> = Vec::with_capacity(total);

        internal!(level = INFO, total, "Starting batch");

        for (index, raw) in addresses.iter().enumerate() {
            let raw = raw.as_ref();

            if cancel.is_cancelled() {
                return Self::cancelled(records, total, index);
            }

            let record = match Address::parse(raw) {
                Err(e) => {
                    debug!(address = raw, error = %e, "Address failed syntax check");
                    classify(raw, &Verdict::InvalidSyntax, 0)
                }
                Ok(address) => match self.client.verify(&address, cancel).await {
                    Ok(ClientOutcome::Resolved { verdict, attempts }) => {
                        classify(raw, &verdict, attempts)
                    }
                    Ok(ClientOutcome::Cancelled { .. }) => {
                        return Self::cancelled(records, total, index);
                    }
                    Err(fatal) => {
                        let unprocessed = total - index;
                        warn!(
                            address = raw,
                            error = %fatal,
                            processed = index,
                            unprocessed,
                            "Fatal verification error, aborting batch"
                        );
                        return BatchResult::new(
                            records,
                            total,
                            BatchStatus::Aborted {
                                reason: fatal.to_string(),
                                unprocessed,
                            },
                        );
                    }
                },
            };

            let progress = Progress {
                processed: index + 1,
                total,
            };

            info!(
                address = raw,
                classification = %record.classification,
                reason = %record.reason,
                attempts = record.attempts,
                processed = progress.processed,
                total,
                "Address resolved"
            );

            observer.on_progress(progress, &record);
            records.push(record);
        }

        let result = BatchResult::new(records, total, BatchStatus::Complete);
        let counts = result.counts();
        internal!(
            level = INFO,
            total = counts.total,
            deliverable = counts.deliverable,
            undeliverable = counts.undeliverable,
            "Batch complete"
        );

        result
    }

    fn cancelled(records: Vec<ClassifiedRecord>, total: usize, index: usize) -> BatchResult {
        let unprocessed = total - index;
        internal!(
            level = INFO,
            processed = index,
            unprocessed,
            "Batch cancelled"
        );
        BatchResult::new(records, total, BatchStatus::Cancelled { unprocessed })
    }
}
