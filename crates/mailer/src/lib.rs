//! # mailer
//!
//! SMTP delivery for the generation forecast newsletter.
//!
//! ## Sending Email
//!
//! ```no_run
//! use mailer::{Email, MailTransport, SmtpConfig, SmtpCredentials, SmtpMailer};
//! use secrecy::SecretString;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mailer::MailError> {
//!     let creds = SmtpCredentials::new("news@example.org", SecretString::from("app-password"));
//!     let config = SmtpConfig::from_env(creds)?;
//!     let client = SmtpMailer::new(config)?;
//!
//!     let email = Email::new("reader@example.org", "Hello", "Plain text body")
//!         .with_html("<p>HTML body</p>");
//!     client.send(&email).await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod transport;
mod types;

pub use client::SmtpMailer;
pub use config::{SmtpConfig, SmtpCredentials};
pub use error::MailError;
pub use transport::{LoggingTransport, MailTransport};
pub use types::Email;

pub use lettre::message::Mailbox;
pub use lettre::Address;
