/// An email message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Primary recipients
    pub to: Vec<String>,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Optional HTML body
    pub html_body: Option<String>,
}

impl Email {
    /// Create a new email with a single recipient.
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            body: body.into(),
            html_body: None,
        }
    }

    /// Set the HTML body (sent as multipart alternative with the text fallback).
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    /// Recipients joined for logging.
    pub fn recipients(&self) -> String {
        self.to.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_builder() {
        let email = Email::new("a@example.org", "Subject", "text").with_html("<p>text</p>");
        assert_eq!(email.to, vec!["a@example.org".to_string()]);
        assert_eq!(email.html_body.as_deref(), Some("<p>text</p>"));
        assert_eq!(email.recipients(), "a@example.org");
    }
}
