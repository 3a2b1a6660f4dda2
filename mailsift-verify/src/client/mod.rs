//! Verification client
//!
//! [`VerificationService`] is one call to the external service and nothing
//! else. [`VerificationClient`] wraps a service with the process-wide
//! [`RateLimiter`] and the [`RetryPolicy`]:
//!
//! 1. Acquire a slot from the rate limiter (re-acquired before every attempt)
//! 2. Call the service, bounded by the per-attempt deadline
//! 3. On a transient failure, back off exponentially and go to 1
//!
//! A fatal failure is handed straight back to the caller. Running out of
//! attempts is not an error: the address resolves to
//! [`Verdict::RetriesExhausted`].

pub mod kickbox;

use std::sync::Arc;

use async_trait::async_trait;
use mailsift_common::{
    Address, outgoing,
    tracing::{debug, warn},
};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{FatalError, TransientError, VerifyError},
    policy::RetryPolicy,
    rate_limiter::RateLimiter,
    types::{VerificationOutcome, Verdict},
};

/// A single verification attempt against an external service
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Ask the service about one address.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Transient`] if the call may succeed on retry
    /// - [`VerifyError::Fatal`] if the service cannot be used at all
    /// - [`VerifyError::InvalidResponse`] if the answer carried no verdict
    async fn verify(&self, address: &Address) -> Result<VerificationOutcome, VerifyError>;
}

/// How the client finished with one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientOutcome {
    /// The address has a verdict ready for classification
    Resolved { verdict: Verdict, attempts: u32 },
    /// The caller cancelled before a verdict was reached
    Cancelled { attempts: u32 },
}

/// Rate-limited, retrying front of a [`VerificationService`]
///
/// Cheap to clone; clones share the service and the rate limiter.
#[derive(Clone)]
pub struct VerificationClient {
    service: Arc<dyn VerificationService>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for VerificationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationClient")
            .field("limiter", &self.limiter)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl VerificationClient {
    #[must_use]
    pub fn new(
        service: Arc<dyn VerificationService>,
        limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            service,
            limiter,
            policy,
        }
    }

    /// Verify one address, retrying transient failures.
    ///
    /// `cancel` is observed while waiting for the rate limiter, while an
    /// attempt is in flight and while backing off.
    ///
    /// # Errors
    ///
    /// Returns the [`FatalError`] if the service reports it is unusable.
    pub async fn verify(
        &self,
        address: &Address,
        cancel: &CancellationToken,
    ) -> Result<ClientOutcome, FatalError> {
        let mut attempts = 0;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(ClientOutcome::Cancelled { attempts }),
                () = self.limiter.acquire() => {}
            }

            attempts += 1;
            outgoing!(address = %address, attempt = attempts, "Verifying address");

            let attempt = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(ClientOutcome::Cancelled { attempts }),
                result = tokio::time::timeout(
                    self.policy.attempt_timeout(),
                    self.service.verify(address),
                ) => result,
            };

            let error = match attempt {
                Ok(Ok(outcome)) => {
                    debug!(
                        address = %address,
                        attempts,
                        category = ?outcome.category,
                        "Verification outcome received"
                    );
                    return Ok(ClientOutcome::Resolved {
                        verdict: Verdict::Verified(outcome),
                        attempts,
                    });
                }
                Ok(Err(VerifyError::Fatal(error))) => return Err(error),
                Ok(Err(VerifyError::InvalidResponse(detail))) => {
                    warn!(
                        address = %address,
                        attempts,
                        detail = %detail,
                        "Verification service returned an unusable response"
                    );
                    return Ok(ClientOutcome::Resolved {
                        verdict: Verdict::MalformedResponse(detail),
                        attempts,
                    });
                }
                Ok(Err(VerifyError::Transient(error))) => error,
                Err(_elapsed) => TransientError::Timeout(format!(
                    "no response within {}ms",
                    self.policy.attempt_timeout_ms
                )),
            };

            if !self.policy.should_retry(attempts) {
                warn!(
                    address = %address,
                    attempts,
                    error = %error,
                    "Retries exhausted"
                );
                return Ok(ClientOutcome::Resolved {
                    verdict: Verdict::RetriesExhausted(error.to_string()),
                    attempts,
                });
            }

            let delay = self.policy.backoff_delay(attempts);
            warn!(
                address = %address,
                attempts,
                remaining = self.policy.remaining_attempts(attempts),
                backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Transient verification failure, backing off"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(ClientOutcome::Cancelled { attempts }),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use parking_lot::Mutex;

    use super::*;
    use crate::types::ServiceCategory;

    /// Replays a fixed script of attempt results, then repeats the last one
    struct Scripted {
        script: Mutex<VecDeque<Result<VerificationOutcome, VerifyError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(script: Vec<Result<VerificationOutcome, VerifyError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }
    }

    fn transient() -> VerifyError {
        TransientError::ServerError {
            status: 503,
            body: "unavailable".to_string(),
        }
        .into()
    }

    #[async_trait]
    impl VerificationService for Scripted {
        async fn verify(&self, _address: &Address) -> Result<VerificationOutcome, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script.lock().pop_front().unwrap_or_else(|| Err(transient()))
        }
    }

    fn client(service: Arc<dyn VerificationService>, max_attempts: u32) -> VerificationClient {
        VerificationClient::new(
            service,
            Arc::new(RateLimiter::new(Duration::from_millis(600))),
            RetryPolicy {
                max_attempts,
                base_delay_ms: 100,
                jitter_factor: 0.0,
                ..RetryPolicy::default()
            },
        )
    }

    fn address() -> Address {
        Address::parse("a@test.com").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let service = Scripted::new(vec![
            Err(transient()),
            Err(transient()),
            Ok(VerificationOutcome::new(ServiceCategory::Deliverable)),
        ]);
        let client = client(service.clone(), 3);

        let outcome = client
            .verify(&address(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ClientOutcome::Resolved {
                verdict: Verdict::Verified(VerificationOutcome::new(ServiceCategory::Deliverable)),
                attempts: 3,
            }
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let service = Scripted::new(vec![]);
        let client = client(service.clone(), 3);

        let outcome = client
            .verify(&address(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            ClientOutcome::Resolved {
                verdict: Verdict::RetriesExhausted(_),
                attempts: 3
            }
        ));
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_waits_for_rate_limiter() {
        let service = Scripted::new(vec![
            Err(transient()),
            Ok(VerificationOutcome::new(ServiceCategory::Deliverable)),
        ]);
        let client = client(service, 3);
        let start = tokio::time::Instant::now();

        client
            .verify(&address(), &CancellationToken::new())
            .await
            .unwrap();

        // Backoff (100ms) is shorter than the limiter interval, so the second
        // attempt is held back by the limiter
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_is_not_retried() {
        let service = Scripted::new(vec![Err(FatalError::AuthenticationFailed(
            "bad key".to_string(),
        )
        .into())]);
        let client = client(service.clone(), 3);

        let error = client
            .verify(&address(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(error, FatalError::AuthenticationFailed(_)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_response_is_not_retried() {
        let service = Scripted::new(vec![Err(VerifyError::InvalidResponse(
            "missing result".to_string(),
        ))]);
        let client = client(service.clone(), 3);

        let outcome = client
            .verify(&address(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ClientOutcome::Resolved {
                verdict: Verdict::MalformedResponse("missing result".to_string()),
                attempts: 1,
            }
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    struct Hanging;

    #[async_trait]
    impl VerificationService for Hanging {
        async fn verify(&self, _address: &Address) -> Result<VerificationOutcome, VerifyError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(VerificationOutcome::new(ServiceCategory::Deliverable))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_counts_as_transient() {
        let client = VerificationClient::new(
            Arc::new(Hanging),
            Arc::new(RateLimiter::new(Duration::from_millis(10))),
            RetryPolicy {
                max_attempts: 2,
                base_delay_ms: 10,
                jitter_factor: 0.0,
                attempt_timeout_ms: 50,
                ..RetryPolicy::default()
            },
        );

        let outcome = client
            .verify(&address(), &CancellationToken::new())
            .await
            .unwrap();

        match outcome {
            ClientOutcome::Resolved {
                verdict: Verdict::RetriesExhausted(error),
                attempts: 2,
            } => assert!(error.contains("no response within 50ms")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_attempt() {
        let service = Scripted::new(vec![Ok(VerificationOutcome::new(
            ServiceCategory::Deliverable,
        ))]);
        let client = client(service.clone(), 3);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = client.verify(&address(), &cancel).await.unwrap();

        assert_eq!(outcome, ClientOutcome::Cancelled { attempts: 0 });
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_backoff() {
        let service = Scripted::new(vec![]);
        let client = VerificationClient::new(
            service.clone(),
            Arc::new(RateLimiter::new(Duration::from_millis(10))),
            RetryPolicy {
                max_attempts: 3,
                base_delay_ms: 10_000,
                jitter_factor: 0.0,
                ..RetryPolicy::default()
            },
        );
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                cancel.cancel();
            })
        };

        let outcome = client.verify(&address(), &cancel).await.unwrap();
        canceller.await.unwrap();

        assert_eq!(outcome, ClientOutcome::Cancelled { attempts: 1 });
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }
}
