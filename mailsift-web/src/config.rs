//! Web front-end configuration

use serde::Deserialize;

/// Configuration for the HTTP front-end
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Address to bind the server to
    ///
    /// Common values:
    /// - `[::]:5000` (IPv6 any address, port 5000)
    /// - `0.0.0.0:5000` (IPv4 any address, port 5000)
    /// - `127.0.0.1:5000` (localhost only, port 5000)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Largest request body accepted, in bytes
    ///
    /// Bounds the size of a single submitted address list.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_listen_address() -> String {
    "[::]:5000".to_string()
}

const fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl WebConfig {
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_address.trim().is_empty() {
            return Err("web.listen_address must not be empty".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("web.max_body_bytes must be greater than 0".to_string());
        }

        Ok(())
    }
}
