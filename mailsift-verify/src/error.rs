//! Typed error handling for verification attempts.
//!
//! A single call to the verification service fails in one of three ways:
//! - Transient failures (network, timeout, 5xx, 429) - retry with backoff
//! - Fatal failures (bad credential, unusable configuration) - abort the batch
//! - Invalid responses (the service answered, but not with a usable verdict) -
//!   resolve the address as a validation error without retrying

use thiserror::Error;

/// Top-level error for one verification attempt.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Recoverable failure; the attempt may be retried.
    #[error("Transient failure: {0}")]
    Transient(#[from] TransientError),

    /// The service itself is unusable; the whole batch must stop.
    #[error("Fatal failure: {0}")]
    Fatal(#[from] FatalError),

    /// The service responded, but the body carried no usable verdict.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Failures worth retrying.
#[derive(Debug, Clone, Error)]
pub enum TransientError {
    /// Could not reach the service.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The attempt ran past its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The service answered with a 5xx status.
    #[error("Server error: HTTP {status}: {body}")]
    ServerError { status: u16, body: String },

    /// The service asked us to slow down (HTTP 429).
    #[error("Rate limited: {0}")]
    RateLimited(String),
}

/// Failures that make every further call pointless.
#[derive(Debug, Clone, Error)]
pub enum FatalError {
    /// The credential was rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The client is misconfigured (bad endpoint, unusable settings).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl VerifyError {
    /// Returns `true` if this attempt should be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Returns `true` if the batch must be aborted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Classify transport failures from the HTTP client.
///
/// - **Timeouts** → Transient
/// - **Connect/request failures** → Transient
/// - **Builder errors** (bad URL etc.) → Fatal
/// - **Body decode failures** → Invalid response
///
/// The request URL carries the credential, so it is stripped before the
/// error is rendered anywhere.
impl From<reqwest::Error> for VerifyError {
    fn from(error: reqwest::Error) -> Self {
        let error = error.without_url();

        if error.is_builder() {
            return Self::Fatal(FatalError::Configuration(error.to_string()));
        }

        if error.is_timeout() {
            return Self::Transient(TransientError::Timeout(error.to_string()));
        }

        if error.is_decode() {
            return Self::InvalidResponse(error.to_string());
        }

        Self::Transient(TransientError::ConnectionFailed(error.to_string()))
    }
}
