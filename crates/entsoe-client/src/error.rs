//! Error types for entsoe-client.

use thiserror::Error;

/// Errors that can occur when talking to the ENTSO-E API or decoding its documents.
#[derive(Debug, Error)]
pub enum EntsoeError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the security token.
    #[error("Unauthorized: the API rejected the security token")]
    Unauthorized,

    /// Non-success response from the API.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The API acknowledged the query but has no data for it.
    #[error("No matching data: {0}")]
    NoMatchingData(String),

    /// The response body is not a document we understand.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EntsoeError {
    /// Whether retrying the same request may succeed.
    ///
    /// Connection problems, timeouts, rate limiting and 5xx responses are
    /// transient. Authentication and decode failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            EntsoeError::Http(e) => !e.is_decode() && !e.is_builder(),
            EntsoeError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether the API answered with HTTP 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, EntsoeError::Unauthorized)
    }
}

impl From<quick_xml::DeError> for EntsoeError {
    fn from(e: quick_xml::DeError) -> Self {
        EntsoeError::Decode(e.to_string())
    }
}
