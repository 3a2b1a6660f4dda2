//! Retry policy for verification attempts.
//!
//! Keeps the retry bound, the exponential backoff and the per-attempt
//! deadline in one place so the client loop only has to ask questions.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry policy configuration for verification attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts per address, including the first one.
    ///
    /// Default: 3 attempts
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff (in milliseconds).
    ///
    /// The delay after attempt `n` is `base * 2^(n - 1)`.
    ///
    /// Default: 1000ms
    #[serde(default = "defaults::base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff delay (in milliseconds).
    ///
    /// Default: 30000ms (30 seconds)
    #[serde(default = "defaults::max_delay_ms")]
    pub max_delay_ms: u64,

    /// Jitter factor for randomizing backoff delays.
    ///
    /// The delay is randomized within ±`jitter_factor`.
    ///
    /// Default: 0.1 (±10%)
    #[serde(default = "defaults::jitter_factor")]
    pub jitter_factor: f64,

    /// Deadline for a single attempt (in milliseconds).
    ///
    /// An attempt that runs past it counts as a transient failure.
    ///
    /// Default: 30000ms (30 seconds)
    #[serde(default = "defaults::attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            base_delay_ms: defaults::base_delay_ms(),
            max_delay_ms: defaults::max_delay_ms(),
            jitter_factor: defaults::jitter_factor(),
            attempt_timeout_ms: defaults::attempt_timeout_ms(),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if another attempt may be made after `attempts` have been made.
    #[must_use]
    pub const fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Get the number of remaining attempts.
    #[must_use]
    pub const fn remaining_attempts(&self, attempts: u32) -> u32 {
        self.max_attempts.saturating_sub(attempts)
    }

    #[must_use]
    pub const fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// How long to wait after the `attempt`-th attempt (1-indexed) failed.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        backoff_delay(
            attempt,
            self.base_delay_ms,
            self.max_delay_ms,
            self.jitter_factor,
        )
    }

    /// Check the policy is usable.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(format!(
                "retry.jitter_factor must be between 0 and 1, got {}",
                self.jitter_factor
            ));
        }

        if self.attempt_timeout_ms == 0 {
            return Err("retry.attempt_timeout_ms must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Exponential backoff with jitter
///
/// `delay = min(base * 2^(attempt - 1), max_delay) * (1 ± jitter)`
pub fn backoff_delay(
    attempt: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter_factor: f64,
) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let delay = if exponent >= 63 {
        max_delay_ms
    } else {
        base_delay_ms.saturating_mul(1u64 << exponent).min(max_delay_ms)
    };

    if !jitter_factor.is_finite() || jitter_factor <= 0.0 || delay == 0 {
        return Duration::from_millis(delay);
    }
    let jitter_factor = jitter_factor.min(1.0);

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let jittered = {
        let jitter_range = (delay as f64) * jitter_factor;
        let jitter: f64 = rand::rng().random_range(-jitter_range..=jitter_range);
        ((delay as f64) + jitter).max(0.0) as u64
    };

    Duration::from_millis(jittered)
}

mod defaults {
    pub const fn max_attempts() -> u32 {
        3
    }

    pub const fn base_delay_ms() -> u64 {
        1000
    }

    pub const fn max_delay_ms() -> u64 {
        30_000
    }

    pub const fn jitter_factor() -> f64 {
        0.1 // ±10%
    }

    pub const fn attempt_timeout_ms() -> u64 {
        30_000
    }
}
