//! Rate-limited batch verification of email addresses.
//!
//! The pipeline, leaf first:
//!
//! 1. [`RateLimiter`]: process-wide minimum spacing between outbound calls
//! 2. [`VerificationClient`]: one [`VerificationService`] call per attempt,
//!    retried with backoff under a [`RetryPolicy`]
//! 3. [`classify`]: the single place a final [`Classification`] is decided
//! 4. [`BatchProcessor`]: drives an ordered address list through the above
//! 5. [`ResultAggregator`]: partitions the result into deliverable and
//!    undeliverable lists

pub mod aggregate;
pub mod classifier;
pub mod client;
pub mod error;
pub mod policy;
pub mod processor;
pub mod rate_limiter;
pub mod types;

pub use aggregate::{ResultAggregator, Summary, UndeliverableEntry};
pub use classifier::classify;
pub use client::{
    ClientOutcome, VerificationClient, VerificationService,
    kickbox::{KickboxConfig, KickboxService},
};
pub use error::{FatalError, TransientError, VerifyError};
pub use policy::RetryPolicy;
pub use processor::{BatchProcessor, NoProgress, ProgressObserver, ProgressUpdate};
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use types::{
    BatchCounts, BatchResult, BatchStatus, Classification, ClassifiedRecord, Progress,
    ServiceCategory, VerificationOutcome, Verdict,
};
