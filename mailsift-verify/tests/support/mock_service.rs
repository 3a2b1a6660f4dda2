//! Scripted verification service for batch tests
//!
//! Each address gets its own queue of attempt results. When the queue runs
//! dry the last scripted result is repeated, and unscripted addresses fall
//! back to the default outcome.
//!
//! ```rust,ignore
//! let service = MockService::builder()
//!     .deliverable("a@test.com")
//!     .risky("c@test.com")
//!     .script("d@test.com", vec![Reply::Transient, Reply::Deliverable])
//!     .build();
//! ```
#![allow(dead_code)] // Not every test file uses every helper

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use mailsift_common::Address;
use mailsift_verify::{
    FatalError, ServiceCategory, TransientError, VerificationOutcome, VerificationService,
    VerifyError,
};
use parking_lot::Mutex;

/// One scripted attempt result
#[derive(Debug, Clone)]
pub enum Reply {
    Deliverable,
    Undeliverable(&'static str),
    Risky,
    Unknown,
    Transient,
    Fatal,
    Invalid,
    /// Never answers within any reasonable deadline
    Hang,
}

impl Reply {
    fn into_result(self) -> Result<VerificationOutcome, VerifyError> {
        match self {
            Self::Deliverable => Ok(VerificationOutcome::new(ServiceCategory::Deliverable)
                .with_reason("accepted_email")),
            Self::Undeliverable(reason) => {
                Ok(VerificationOutcome::new(ServiceCategory::Undeliverable).with_reason(reason))
            }
            Self::Risky => {
                let mut outcome = VerificationOutcome::new(ServiceCategory::Risky)
                    .with_reason("low_deliverability");
                outcome.accept_all = Some(true);
                Ok(outcome)
            }
            Self::Unknown => Ok(VerificationOutcome::new(ServiceCategory::Unknown)),
            Self::Transient => Err(TransientError::ServerError {
                status: 503,
                body: "Service Unavailable".to_string(),
            }
            .into()),
            Self::Fatal => Err(FatalError::AuthenticationFailed("HTTP 403".to_string()).into()),
            Self::Invalid => Err(VerifyError::InvalidResponse(
                "response has no result field".to_string(),
            )),
            Self::Hang => unreachable!("hanging replies are handled by the service"),
        }
    }
}

#[derive(Default)]
pub struct MockServiceBuilder {
    scripts: HashMap<String, Vec<Reply>>,
    fallback: Option<Reply>,
}

impl MockServiceBuilder {
    #[must_use]
    pub fn script(mut self, address: &str, replies: Vec<Reply>) -> Self {
        self.scripts.insert(address.to_string(), replies);
        self
    }

    #[must_use]
    pub fn deliverable(self, address: &str) -> Self {
        self.script(address, vec![Reply::Deliverable])
    }

    #[must_use]
    pub fn risky(self, address: &str) -> Self {
        self.script(address, vec![Reply::Risky])
    }

    #[must_use]
    pub fn fatal(self, address: &str) -> Self {
        self.script(address, vec![Reply::Fatal])
    }

    /// Reply used for addresses without a script
    #[must_use]
    pub fn fallback(mut self, reply: Reply) -> Self {
        self.fallback = Some(reply);
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<MockService> {
        Arc::new(MockService {
            scripts: Mutex::new(self.scripts),
            fallback: self.fallback.unwrap_or(Reply::Deliverable),
            calls: Mutex::new(Vec::new()),
        })
    }
}

pub struct MockService {
    scripts: Mutex<HashMap<String, Vec<Reply>>>,
    fallback: Reply,
    calls: Mutex<Vec<(String, tokio::time::Instant)>>,
}

impl MockService {
    #[must_use]
    pub fn builder() -> MockServiceBuilder {
        MockServiceBuilder::default()
    }

    /// Addresses in the order the service saw them, one entry per attempt
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(a, _)| a.clone()).collect()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Instants at which each attempt reached the service
    #[must_use]
    pub fn call_times(&self) -> Vec<tokio::time::Instant> {
        self.calls.lock().iter().map(|(_, t)| *t).collect()
    }

    fn next_reply(&self, address: &str) -> Reply {
        let mut scripts = self.scripts.lock();
        match scripts.get_mut(address) {
            Some(replies) if replies.len() > 1 => replies.remove(0),
            Some(replies) => replies
                .first()
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()),
            None => self.fallback.clone(),
        }
    }
}

#[async_trait]
impl VerificationService for MockService {
    async fn verify(&self, address: &Address) -> Result<VerificationOutcome, VerifyError> {
        self.calls
            .lock()
            .push((address.to_string(), tokio::time::Instant::now()));

        match self.next_reply(address.as_str()) {
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(VerifyError::InvalidResponse("hung".to_string()))
            }
            reply => reply.into_result(),
        }
    }
}
