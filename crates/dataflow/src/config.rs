use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::retry::{RetryPolicy, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};

/// Default concurrent email submissions.
pub const DEFAULT_MAX_CONCURRENT_SENDS: usize = 8;

/// Runtime settings of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Retry policy of the capacity fetch.
    pub capacity_retry: RetryPolicy,
    /// Retry policy of the whole dispatch stage.
    pub dispatch_retry: RetryPolicy,
    /// Upper bound on emails in flight.
    pub max_concurrent_sends: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity_retry: RetryPolicy::default(),
            dispatch_retry: RetryPolicy::default(),
            max_concurrent_sends: DEFAULT_MAX_CONCURRENT_SENDS,
        }
    }
}

impl PipelineConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `DATAFLOW_RETRY_ATTEMPTS` - Default: 3
    /// - `DATAFLOW_RETRY_DELAY_SECS` - Default: 60
    /// - `DATAFLOW_MAX_CONCURRENT_SENDS` - Default: 8
    pub fn from_env() -> Result<Self, ConfigError> {
        let attempts = parse_var("DATAFLOW_RETRY_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        let delay = parse_var("DATAFLOW_RETRY_DELAY_SECS", DEFAULT_DELAY.as_secs())?;
        let max_concurrent_sends = parse_var("DATAFLOW_MAX_CONCURRENT_SENDS", DEFAULT_MAX_CONCURRENT_SENDS)?;

        if attempts == 0 {
            return Err(ConfigError::Invalid("DATAFLOW_RETRY_ATTEMPTS must be at least 1".to_string()));
        }
        if max_concurrent_sends == 0 {
            return Err(ConfigError::Invalid(
                "DATAFLOW_MAX_CONCURRENT_SENDS must be at least 1".to_string(),
            ));
        }

        let retry = RetryPolicy::new(attempts, Duration::from_secs(delay));
        Ok(Self {
            capacity_retry: retry,
            dispatch_retry: retry,
            max_concurrent_sends,
        })
    }

    /// Builder method to set both retry policies.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.capacity_retry = retry;
        self.dispatch_retry = retry;
        self
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("{}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
