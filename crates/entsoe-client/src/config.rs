//! Configuration types for entsoe-client.

use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::EntsoeError;

/// Public REST endpoint of the transparency platform.
pub const DEFAULT_BASE_URL: &str = "https://web-api.tp.entsoe.eu/api";

/// Configuration for connecting to the ENTSO-E API.
#[derive(Debug, Clone)]
pub struct EntsoeConfig {
    /// Endpoint URL (e.g., "https://web-api.tp.entsoe.eu/api").
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Security token issued by the platform.
    api_key: SecretString,
}

impl EntsoeConfig {
    /// Create a configuration for the public endpoint.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            api_key,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `ENTSOE_BASE_URL` - Default: https://web-api.tp.entsoe.eu/api
    /// - `ENTSOE_TIMEOUT_SECS` - Default: 30
    ///
    /// The API key is not read here; it comes from the caller's secret store.
    pub fn from_env(api_key: SecretString) -> Result<Self, EntsoeError> {
        let base_url = env::var("ENTSOE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout_secs = env::var("ENTSOE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|e| EntsoeError::Config(format!("Invalid ENTSOE_TIMEOUT_SECS: {}", e)))?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            api_key,
        })
    }

    /// Builder method to point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the API key (exposes the secret).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}
