//! Error types for the mailsift-common crate.

use thiserror::Error;

/// Reasons a candidate string is not a well-formed address.
///
/// These are detected locally, before any verification call is made, and
/// are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The candidate was the empty string.
    #[error("Address is empty")]
    Empty,

    /// The candidate has no `@` separator.
    #[error("Address has no '@' separator: {0}")]
    MissingSeparator(String),

    /// The candidate has more than one `@`.
    #[error("Address has {count} '@' separators: {address}")]
    MultipleSeparators { address: String, count: usize },

    /// Nothing before the `@`.
    #[error("Address has an empty local part: {0}")]
    EmptyLocalPart(String),

    /// Nothing after the `@`.
    #[error("Address has an empty domain: {0}")]
    EmptyDomain(String),
}
