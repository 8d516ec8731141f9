//! Error types for the newsletter pipeline.

use entsoe_client::EntsoeError;
use mailer::MailError;
use thiserror::Error;

use crate::pipeline::RunStage;

/// Configuration or credential problems found before a run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A setting could not be parsed.
    #[error("invalid setting: {0}")]
    Invalid(String),

    /// Capacity API client could not be built.
    #[error("capacity client: {0}")]
    Entsoe(#[from] EntsoeError),

    /// Mail transport could not be built.
    #[error("mail transport: {0}")]
    Mail(#[from] MailError),
}

/// The capacity stage failed for good.
#[derive(Debug, Error)]
pub enum CapacityError {
    /// Retries exhausted or a non-retryable API error.
    #[error("installed capacity unavailable: {0}")]
    Fetch(#[from] EntsoeError),
}

/// The forecast payload could not be decoded.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("forecast payload: {0}")]
    Decode(#[from] EntsoeError),
}

/// Recipient directory failures.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Missing required environment variable.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A recipient entry could not be understood.
    #[error("invalid recipient entry: {0}")]
    Invalid(String),

    /// Reading the directory file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The directory file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The dispatch stage failed as a whole.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Recipients could not be loaded.
    #[error("recipient directory: {0}")]
    Directory(#[from] DirectoryError),

    /// The newsletter body could not be rendered.
    #[error("newsletter template: {0}")]
    Render(#[from] askama::Error),

    /// Every submission failed, which points at the transport rather than a recipient.
    #[error("all {attempted} submissions failed")]
    AllFailed { attempted: usize },
}

/// Errors that end a run in the `Failed` state.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("capacity stage failed: {0}")]
    Capacity(#[from] CapacityError),

    #[error("dispatch stage failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl PipelineError {
    /// The stage the run was trying to reach when it failed.
    pub fn failed_stage(&self) -> RunStage {
        match self {
            PipelineError::Capacity(_) => RunStage::CapacityFetched,
            PipelineError::Dispatch(_) => RunStage::Dispatched,
        }
    }
}
