//! Credential lookup for the capacity API and the SMTP relay.

use std::env;

use async_trait::async_trait;
use mailer::SmtpCredentials;
use secrecy::SecretString;

use crate::error::ConfigError;

/// Supplies secrets at startup. Implementations may call out to a secret store.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Security token for the capacity API.
    async fn entsoe_api_key(&self) -> Result<SecretString, ConfigError>;

    /// Login for the SMTP relay.
    async fn smtp_credentials(&self) -> Result<SmtpCredentials, ConfigError>;
}

/// Reads credentials from the environment.
///
/// Required:
/// - `ENTSOE_API_KEY`
/// - `SMTP_USERNAME`
/// - `SMTP_PASSWORD`
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

#[async_trait]
impl CredentialsProvider for EnvCredentials {
    async fn entsoe_api_key(&self) -> Result<SecretString, ConfigError> {
        require("ENTSOE_API_KEY").map(SecretString::from)
    }

    async fn smtp_credentials(&self) -> Result<SmtpCredentials, ConfigError> {
        let username = require("SMTP_USERNAME")?;
        let password = require("SMTP_PASSWORD")?;
        Ok(SmtpCredentials::new(username, SecretString::from(password)))
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}
