//! Type definitions for verification outcomes, classified records and batch results

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Category reported by the verification service for one address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Deliverable,
    Undeliverable,
    Risky,
    Unknown,
}

/// Result of one successful call to the verification service
///
/// Produced once per address per attempt and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub category: ServiceCategory,
    /// Service reason code, e.g. `rejected_email` or `low_deliverability`
    pub reason: Option<String>,
    /// The address is a role account (`sales@`, `support@`, ...)
    pub role: Option<bool>,
    /// The domain hands out disposable addresses
    pub disposable: Option<bool>,
    /// The domain accepts mail for any local part
    pub accept_all: Option<bool>,
}

impl VerificationOutcome {
    /// An outcome with no reason or flags set
    #[must_use]
    pub const fn new(category: ServiceCategory) -> Self {
        Self {
            category,
            reason: None,
            role: None,
            disposable: None,
            accept_all: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Everything the pipeline learned about one address, ready for classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Failed the local well-formedness check; the service was never called
    InvalidSyntax,
    /// The service returned a usable outcome
    Verified(VerificationOutcome),
    /// Every attempt failed transiently; holds the last error
    RetriesExhausted(String),
    /// The service answered without a usable verdict
    MalformedResponse(String),
}

/// Final category of an address. Exactly one per address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Deliverable,
    Undeliverable,
}

impl Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deliverable => f.write_str("deliverable"),
            Self::Undeliverable => f.write_str("undeliverable"),
        }
    }
}

/// A resolved address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    /// The address exactly as it was supplied
    pub address: String,
    pub classification: Classification,
    pub reason: String,
    /// Verification calls made for this address (0 for invalid syntax)
    pub attempts: u32,
}

impl ClassifiedRecord {
    #[must_use]
    pub const fn is_deliverable(&self) -> bool {
        matches!(self.classification, Classification::Deliverable)
    }
}

/// How a batch run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum BatchStatus {
    /// Every address was resolved
    Complete,
    /// A fatal error stopped the run
    Aborted { reason: String, unprocessed: usize },
    /// The caller cancelled the run
    Cancelled { unprocessed: usize },
}

impl BatchStatus {
    /// Addresses that were never resolved
    #[must_use]
    pub const fn unprocessed(&self) -> usize {
        match self {
            Self::Complete => 0,
            Self::Aborted { unprocessed, .. } | Self::Cancelled { unprocessed } => *unprocessed,
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Counts over the resolved records of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub total: usize,
    pub deliverable: usize,
    pub undeliverable: usize,
}

/// Outcome of one batch run
///
/// Records are in input order. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    records: Vec<ClassifiedRecord>,
    counts: BatchCounts,
    requested: usize,
    status: BatchStatus,
}

impl BatchResult {
    /// Build a result and compute its counts.
    #[must_use]
    pub fn new(records: Vec<ClassifiedRecord>, requested: usize, status: BatchStatus) -> Self {
        let deliverable = records.iter().filter(|r| r.is_deliverable()).count();
        let counts = BatchCounts {
            total: records.len(),
            deliverable,
            undeliverable: records.len() - deliverable,
        };

        Self {
            records,
            counts,
            requested,
            status,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[ClassifiedRecord] {
        &self.records
    }

    #[must_use]
    pub const fn counts(&self) -> BatchCounts {
        self.counts
    }

    /// Number of addresses handed to the batch
    #[must_use]
    pub const fn requested(&self) -> usize {
        self.requested
    }

    #[must_use]
    pub const fn status(&self) -> &BatchStatus {
        &self.status
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}

/// Incremental progress of a batch, reported after each address resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    /// Whole-number completion percentage (100 for an empty batch)
    #[must_use]
    pub const fn percentage(&self) -> usize {
        if self.total == 0 {
            100
        } else {
            self.processed * 100 / self.total
        }
    }
}
