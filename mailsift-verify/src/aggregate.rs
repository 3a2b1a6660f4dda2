//! Partitioning of a batch into deliverable and undeliverable lists

use serde::Serialize;

use crate::types::{BatchResult, BatchStatus};

/// An undeliverable address together with why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndeliverableEntry {
    pub email: String,
    pub reason: String,
}

/// Aggregated view of a batch, in the shape reports are rendered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Deliverable addresses, in input order
    pub deliverable: Vec<String>,
    /// Undeliverable addresses with reasons, in input order
    pub undeliverable: Vec<UndeliverableEntry>,
    /// Resolved addresses; always `deliverable_count + undeliverable_count`
    pub total: usize,
    pub deliverable_count: usize,
    pub undeliverable_count: usize,
    /// Addresses handed to the batch, resolved or not
    pub requested: usize,
    pub status: BatchStatus,
}

impl Summary {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    /// Addresses the batch never reached
    #[must_use]
    pub const fn unprocessed(&self) -> usize {
        self.status.unprocessed()
    }
}

/// Partitions classified records
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// Split `result` into its two ordered partitions and count them.
    #[must_use]
    pub fn aggregate(result: &BatchResult) -> Summary {
        let (deliverable, undeliverable): (Vec<_>, Vec<_>) = result
            .records()
            .iter()
            .partition(|record| record.is_deliverable());

        let deliverable: Vec<String> = deliverable
            .into_iter()
            .map(|record| record.address.clone())
            .collect();

        let undeliverable: Vec<UndeliverableEntry> = undeliverable
            .into_iter()
            .map(|record| UndeliverableEntry {
                email: record.address.clone(),
                reason: record.reason.clone(),
            })
            .collect();

        Summary {
            total: deliverable.len() + undeliverable.len(),
            deliverable_count: deliverable.len(),
            undeliverable_count: undeliverable.len(),
            deliverable,
            undeliverable,
            requested: result.requested(),
            status: result.status().clone(),
        }
    }
}
