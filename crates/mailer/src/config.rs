use secrecy::{ExposeSecret, SecretString};
use std::env;

use crate::MailError;

/// Login for the SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpCredentials {
    /// Account name, usually the sender address
    pub username: String,
    password: SecretString,
}

impl SmtpCredentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Get the password (exposes the secret).
    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Configuration for connecting to an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP host (default: 127.0.0.1)
    pub smtp_host: String,
    /// SMTP port (default: 587)
    pub smtp_port: u16,
    /// Sender address (default: the credentials' username)
    pub from_address: String,
    /// Relay login
    pub credentials: SmtpCredentials,
}

impl SmtpConfig {
    /// Create a new configuration with explicit values.
    pub fn new(smtp_host: impl Into<String>, smtp_port: u16, credentials: SmtpCredentials) -> Self {
        Self {
            smtp_host: smtp_host.into(),
            smtp_port,
            from_address: credentials.username.clone(),
            credentials,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Credentials are supplied by the caller; only the relay location is read here.
    ///
    /// Optional (with defaults):
    /// - `SMTP_HOST` - Default: 127.0.0.1
    /// - `SMTP_PORT` - Default: 587
    /// - `SMTP_FROM` - Default: credentials username
    pub fn from_env(credentials: SmtpCredentials) -> Result<Self, MailError> {
        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|e| MailError::Config(format!("Invalid SMTP_PORT: {}", e)))?;

        let from_address = env::var("SMTP_FROM").unwrap_or_else(|_| credentials.username.clone());

        Ok(Self {
            smtp_host,
            smtp_port,
            from_address,
            credentials,
        })
    }

    /// Builder method to set the sender address.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from_address = from.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_defaults_to_username() {
        let creds = SmtpCredentials::new("news@example.org", SecretString::from("pw"));
        let config = SmtpConfig::new("smtp.example.org", 465, creds);
        assert_eq!(config.from_address, "news@example.org");

        let config = config.with_from("Newsletter <noreply@example.org>");
        assert_eq!(config.from_address, "Newsletter <noreply@example.org>");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = SmtpCredentials::new("news@example.org", SecretString::from("hunter2"));
        let config = SmtpConfig::new("127.0.0.1", 587, creds);
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert_eq!(config.credentials.password(), "hunter2");
    }
}
