//! Process-wide pacing of calls to the verification service
//!
//! The service enforces its quota per credential, not per batch, so a single
//! [`RateLimiter`] is shared (behind an `Arc`) by every batch running in the
//! process. It behaves as a leaky bucket with a capacity of one: every
//! [`RateLimiter::acquire`] returns at least `min_interval` after the
//! previous one returned.
//!
//! # Example
//!
//! ```text
//! min_interval: 600ms (100 calls/minute)
//! - t=0ms    acquire #1 returns immediately
//! - t=600ms  acquire #2 returns (it was called at t=10ms)
//! - t=1200ms acquire #3 returns
//! ```
//!
//! Waiters are served in arrival order. Dropping an `acquire` future while
//! it waits (for instance because the batch was cancelled) releases its place
//! without consuming a slot.

use std::time::Duration;

use mailsift_common::tracing;
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};

/// Configuration for rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum spacing between two calls to the service (in milliseconds)
    ///
    /// Default: 600ms, i.e. at most 100 calls per minute
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

const fn default_min_interval_ms() -> u64 {
    600
}

impl RateLimitConfig {
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// # Errors
    ///
    /// Returns a description of the problem if the interval is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_interval_ms == 0 {
            return Err("rate_limit.min_interval_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Minimum-interval gate in front of the verification service
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// When the most recent `acquire` returned
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.min_interval())
    }

    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the next call may be issued.
    ///
    /// The lock is held across the wait so that concurrent callers queue up
    /// behind each other instead of all waking at the same instant.
    pub async fn acquire(&self) {
        let mut last_dispatch = self.last_dispatch.lock().await;

        if let Some(previous) = *last_dispatch {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                tracing::trace!(
                    wait_ms = u64::try_from((ready_at - now).as_millis()).unwrap_or(u64::MAX),
                    "Waiting for verification slot"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_dispatch = Some(Instant::now());
    }

    /// Time remaining until an `acquire` would return without waiting
    pub async fn time_until_available(&self) -> Duration {
        let last_dispatch = self.last_dispatch.lock().await;
        last_dispatch.map_or(Duration::ZERO, |previous| {
            (previous + self.min_interval).saturating_duration_since(Instant::now())
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_millis(600));
        let start = Instant::now();

        limiter.acquire().await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_acquires_take_two_intervals() {
        let limiter = RateLimiter::default();
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() >= Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_counts_towards_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(600));
        limiter.acquire().await;

        tokio::time::sleep(Duration::from_millis(1000)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_between_concurrent_callers() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(600)));
        let mut handles = Vec::new();

        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut returned = Vec::new();
        for handle in handles {
            if let Ok(at) = handle.await {
                returned.push(at);
            }
        }
        returned.sort();

        assert_eq!(returned.len(), 4);
        for pair in returned.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(600));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_acquire_does_not_consume_slot() {
        let limiter = RateLimiter::new(Duration::from_millis(600));
        limiter.acquire().await;

        // Give up part way through the wait
        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), limiter.acquire()).await;
        assert!(abandoned.is_err());

        let remaining = limiter.time_until_available().await;
        assert_eq!(remaining, Duration::from_millis(500));
    }

    #[test]
    fn test_config_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.min_interval_ms, 600);
        assert_eq!(config.min_interval(), Duration::from_millis(600));
        assert!(config.validate().is_ok());
        assert!(RateLimitConfig { min_interval_ms: 0 }.validate().is_err());
    }
}
