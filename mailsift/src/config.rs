//! Settings file loading
//!
//! Settings are read from a RON file located with the following precedence:
//! 1. an explicit path (the `--config` flag)
//! 2. the `MAILSIFT_CONFIG` environment variable
//! 3. `./mailsift.config.ron`
//! 4. `/etc/mailsift/mailsift.config.ron`
//!
//! If none of these exist the built-in defaults are used. Every field is
//! optional in the file.

use std::path::{Path, PathBuf};

use mailsift_report::OutputPaths;
use mailsift_verify::{KickboxConfig, RateLimitConfig, RetryPolicy};
use mailsift_web::WebConfig;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "MAILSIFT_CONFIG";
pub const API_KEY_ENV: &str = "KICKBOX_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },

    #[error("No API key configured; set KICKBOX_API_KEY or verification.api_key")]
    MissingApiKey,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where the `check` command writes its results
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Default: `email_validation_report.txt`
    #[serde(default = "defaults::report")]
    pub report: PathBuf,

    /// Default: `deliverable_emails.txt`
    #[serde(default = "defaults::deliverable")]
    pub deliverable: PathBuf,

    /// Default: `undeliverable_emails.csv`
    #[serde(default = "defaults::undeliverable")]
    pub undeliverable: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report: defaults::report(),
            deliverable: defaults::deliverable(),
            undeliverable: defaults::undeliverable(),
        }
    }
}

impl OutputConfig {
    #[must_use]
    pub fn paths(&self) -> OutputPaths {
        OutputPaths {
            report: self.report.clone(),
            deliverable: self.deliverable.clone(),
            undeliverable: self.undeliverable.clone(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn report() -> PathBuf {
        PathBuf::from("email_validation_report.txt")
    }

    pub fn deliverable() -> PathBuf {
        PathBuf::from("deliverable_emails.txt")
    }

    pub fn undeliverable() -> PathBuf {
        PathBuf::from("undeliverable_emails.csv")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub verification: KickboxConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryPolicy,
    pub web: WebConfig,
    pub output: OutputConfig,
}

impl Settings {
    /// Locate, read and validate the settings, then apply the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a named config file is missing or unreadable, the
    /// file does not parse, no API key is available, or a value is invalid.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = find_config_file(
            explicit,
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            &default_paths(),
        )?;

        let mut settings = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::info!("No configuration file found, using defaults");
                Self::default()
            }
        };

        settings.apply_api_key(std::env::var(API_KEY_ENV).ok());
        settings.validate()?;

        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(settings)
    }

    /// A non-blank `key` replaces whatever the file configured.
    pub fn apply_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|key| !key.trim().is_empty()) {
            self.verification.api_key = Some(key);
        }
    }

    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .verification
            .api_key
            .as_deref()
            .is_none_or(|key| key.trim().is_empty())
        {
            return Err(ConfigError::MissingApiKey);
        }

        self.verification.validate().map_err(ConfigError::Invalid)?;
        self.rate_limit.validate().map_err(ConfigError::Invalid)?;
        self.retry.validate().map_err(ConfigError::Invalid)?;
        self.web.validate().map_err(ConfigError::Invalid)?;

        Ok(())
    }
}

fn default_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./mailsift.config.ron"),
        PathBuf::from("/etc/mailsift/mailsift.config.ron"),
    ]
}

/// Pick the settings file to read, if any.
///
/// # Errors
///
/// An explicit path or an environment path that does not exist is an error;
/// missing default paths are skipped.
pub fn find_config_file(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    defaults: &[PathBuf],
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit.map(Path::to_path_buf).or(from_env) {
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::NotFound(path));
    }

    Ok(defaults.iter().find(|path| path.exists()).cloned())
}
