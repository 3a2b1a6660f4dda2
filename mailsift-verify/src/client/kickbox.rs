//! Kickbox-compatible HTTP verification service
//!
//! One `GET {endpoint}?email=<address>&apikey=<key>` per attempt. The
//! response is read against an explicit schema; anything that does not carry
//! a recognised `result` is reported as an invalid response rather than
//! guessed at.
//!
//! Status handling:
//! - **2xx** → parse the body
//! - **401/403** → Fatal (credential rejected)
//! - **429** → Transient (rate limited)
//! - **408, 5xx** → Transient
//! - **anything else** → Invalid response

use std::time::Duration;

use async_trait::async_trait;
use mailsift_common::{Address, incoming};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::{
    client::VerificationService,
    error::{FatalError, TransientError, VerifyError},
    types::{ServiceCategory, VerificationOutcome},
};

/// Configuration for the Kickbox service
#[derive(Clone, Serialize, Deserialize)]
pub struct KickboxConfig {
    /// API credential. Usually supplied through the environment rather than
    /// written into a config file.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Verification endpoint
    ///
    /// Default: `https://api.kickbox.com/v2/verify`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for establishing the connection (in seconds)
    ///
    /// Default: 10 seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl std::fmt::Debug for KickboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KickboxConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Default for KickboxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl KickboxConfig {
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        Url::parse(&self.endpoint)
            .map_err(|e| format!("verification.endpoint '{}' is not a URL: {e}", self.endpoint))?;
        if self.connect_timeout_secs == 0 {
            return Err("verification.connect_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn default_endpoint() -> String {
    "https://api.kickbox.com/v2/verify".to_string()
}

const fn default_connect_timeout() -> u64 {
    10
}

/// Response body of the verification endpoint
///
/// Every field is optional on the wire; which ones are required is decided
/// in [`KickboxResponse::into_outcome`].
#[derive(Debug, Default, Deserialize)]
struct KickboxResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    role: Option<bool>,
    #[serde(default)]
    disposable: Option<bool>,
    #[serde(default)]
    accept_all: Option<bool>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

impl KickboxResponse {
    fn into_outcome(self) -> Result<VerificationOutcome, VerifyError> {
        if self.success == Some(false) {
            let message = self
                .message
                .unwrap_or_else(|| "request was not successful".to_string());

            if message.to_ascii_lowercase().contains("api key") {
                return Err(FatalError::AuthenticationFailed(message).into());
            }

            return Err(VerifyError::InvalidResponse(message));
        }

        let category = match self.result.as_deref() {
            Some("deliverable") => ServiceCategory::Deliverable,
            Some("undeliverable") => ServiceCategory::Undeliverable,
            Some("risky") => ServiceCategory::Risky,
            Some("unknown") => ServiceCategory::Unknown,
            Some(other) => {
                return Err(VerifyError::InvalidResponse(format!(
                    "unrecognised result '{other}'"
                )));
            }
            None => {
                return Err(VerifyError::InvalidResponse(
                    "response has no result field".to_string(),
                ));
            }
        };

        Ok(VerificationOutcome {
            category,
            reason: self.reason.filter(|reason| !reason.is_empty()),
            role: self.role,
            disposable: self.disposable,
            accept_all: self.accept_all,
        })
    }
}

/// HTTP client for a Kickbox-compatible verification endpoint
#[derive(Clone)]
pub struct KickboxService {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl std::fmt::Debug for KickboxService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KickboxService")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl KickboxService {
    /// Build a service from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError::Configuration`] if no credential is set, the
    /// endpoint is not a valid URL, or the HTTP client cannot be built.
    pub fn new(config: &KickboxConfig) -> Result<Self, FatalError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| FatalError::Configuration("no API key configured".to_string()))?;

        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            FatalError::Configuration(format!("invalid endpoint '{}': {e}", config.endpoint))
        })?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("mailsift/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FatalError::Configuration(e.without_url().to_string()))?;

        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn error_for_status(status: StatusCode, body: String) -> VerifyError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FatalError::AuthenticationFailed(format!("HTTP {}: {body}", status.as_u16())).into()
        }
        StatusCode::TOO_MANY_REQUESTS => TransientError::RateLimited(body).into(),
        StatusCode::REQUEST_TIMEOUT => TransientError::ServerError {
            status: status.as_u16(),
            body,
        }
        .into(),
        status if status.is_server_error() => TransientError::ServerError {
            status: status.as_u16(),
            body,
        }
        .into(),
        status => VerifyError::InvalidResponse(format!("HTTP {}: {body}", status.as_u16())),
    }
}

#[async_trait]
impl VerificationService for KickboxService {
    async fn verify(&self, address: &Address) -> Result<VerificationOutcome, VerifyError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[("email", address.as_str()), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        incoming!(
            address = %address,
            status = status.as_u16(),
            "Verification service responded"
        );

        if !status.is_success() {
            return Err(error_for_status(status, body));
        }

        let parsed: KickboxResponse = serde_json::from_str(&body)
            .map_err(|e| VerifyError::InvalidResponse(format!("unparseable body: {e}")))?;

        parsed.into_outcome()
    }
}
