use async_trait::async_trait;
use lettre::{
    message::{MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, instrument};

use crate::{Email, MailError, MailTransport, SmtpConfig};

/// Client for sending emails through an SMTP relay.
///
/// Uses connection pooling so a newsletter run reuses one session.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a new client with the given configuration.
    ///
    /// The relay is contacted lazily on the first send.
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(
            config.credentials.username.clone(),
            config.credentials.password().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            username = %config.credentials.username,
            "Created SMTP client"
        );

        Ok(Self {
            transport,
            from_address: config.from_address,
        })
    }

    /// Check that the relay accepts connections.
    pub async fn test_connection(&self) -> Result<bool, MailError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    #[instrument(skip(self, email), fields(to = %email.recipients(), subject = %email.subject))]
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = build_message(&self.from_address, email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        info!(to = %email.recipients(), subject = %email.subject, "Email sent successfully");
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

/// Build a lettre Message from our Email type.
fn build_message(from_address: &str, email: &Email) -> Result<Message, MailError> {
    let from = from_address
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("From: {}", e)))?;

    let mut builder = Message::builder().from(from).subject(&email.subject);

    for to in &email.to {
        let addr = to
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("To '{}': {}", to, e)))?;
        builder = builder.to(addr);
    }

    let message = if let Some(html) = &email.html_body {
        builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(email.body.clone()))
                    .singlepart(SinglePart::html(html.clone())),
            )
            .map_err(|e| MailError::BuildEmail(e.to_string()))?
    } else {
        builder
            .body(email.body.clone())
            .map_err(|e| MailError::BuildEmail(e.to_string()))?
    };

    Ok(message)
}
