//! Newsletter fan-out for the generation forecast pipeline.
//!
//! This crate sends one email per subscriber through any
//! [`MailTransport`], with a bounded number of sends in flight. A failed send
//! never stops the others; failures are collected in the returned
//! [`BroadcastReport`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use broadcaster::Broadcaster;
//! use mailer::{Email, LoggingTransport};
//!
//! # async fn example() {
//! let broadcaster = Broadcaster::new(Arc::new(LoggingTransport)).with_max_in_flight(4);
//!
//! let emails = vec![
//!     Email::new("a@example.org", "Hello", "Hello A"),
//!     Email::new("b@example.org", "Hello", "Hello B"),
//! ];
//! let report = broadcaster.broadcast(emails).await;
//! println!("delivered {} / {}", report.delivered.len(), report.attempted());
//! # }
//! ```

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use mailer::{Email, MailError, MailTransport};
use thiserror::Error;
use tracing::{info, warn};

/// Default number of concurrent sends.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Errors that can occur during broadcast operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Mail delivery error.
    #[error("Mail error: {0}")]
    Mail(#[from] MailError),
}

/// A recipient whose email could not be delivered.
#[derive(Debug)]
pub struct Failure {
    pub recipient: String,
    pub error: Error,
}

/// Outcome of one broadcast.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Recipients whose email was accepted by the transport.
    pub delivered: Vec<String>,
    /// Recipients whose email failed.
    pub failed: Vec<Failure>,
}

impl BroadcastReport {
    /// Number of emails submitted.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// Whether at least one email was submitted and none got through.
    pub fn all_failed(&self) -> bool {
        self.attempted() > 0 && self.delivered.is_empty()
    }
}

/// A broadcaster for sending newsletters.
#[derive(Clone)]
pub struct Broadcaster {
    transport: Arc<dyn MailTransport>,
    max_in_flight: usize,
}

impl Broadcaster {
    /// Create a broadcaster over the given transport.
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        info!(transport = transport.name(), "Broadcaster ready");
        Self {
            transport,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Limit the number of concurrent sends (at least one).
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Send a single email.
    pub async fn send(&self, email: &Email) -> Result<(), Error> {
        info!(recipient = %email.recipients(), "Sending newsletter");
        self.transport.send(email).await.map_err(Error::from)
    }

    /// Send every email, at most `max_in_flight` at a time, and wait for all of them.
    pub async fn broadcast(&self, emails: Vec<Email>) -> BroadcastReport {
        let results: Vec<(String, Result<(), Error>)> = stream::iter(emails)
            .map(|email| async move {
                let recipient = email.recipients();
                let result = self.send(&email).await;
                (recipient, result)
            })
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        let mut report = BroadcastReport::default();
        for (recipient, result) in results {
            match result {
                Ok(()) => report.delivered.push(recipient),
                Err(error) => {
                    warn!(recipient = %recipient, error = %error, "Newsletter delivery failed");
                    report.failed.push(Failure { recipient, error });
                }
            }
        }

        info!(
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "Broadcast finished"
        );
        report
    }
}
