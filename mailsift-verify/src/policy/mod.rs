//! Policy abstractions for verification.
//!
//! - [`RetryPolicy`]: retry bound, exponential backoff and per-attempt deadline

pub mod retry;

pub use retry::RetryPolicy;
