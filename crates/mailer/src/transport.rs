//! Mail transport trait and implementations.

use async_trait::async_trait;

use crate::{Email, MailError};

/// Trait for delivering emails.
///
/// Abstracted to support different transports (SMTP, dry runs, tests, etc.)
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one email.
    async fn send(&self, email: &Email) -> Result<(), MailError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// A logging transport for dry runs that logs every email instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LoggingTransport;

#[async_trait]
impl MailTransport for LoggingTransport {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        tracing::info!(
            to = %email.recipients(),
            subject = %email.subject,
            html = email.html_body.is_some(),
            "[dry-run] Would send email:\n{}",
            email.body
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "logging"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_transport() {
        let transport = LoggingTransport;
        let email = Email::new("reader@example.org", "Newsletter", "body");

        // Should not error
        transport.send(&email).await.unwrap();
        assert_eq!(transport.name(), "logging");
    }
}
