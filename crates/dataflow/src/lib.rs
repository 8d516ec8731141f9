//! Generation forecast newsletter pipeline.
//!
//! This crate provides the [`Pipeline`] type, which turns a generation
//! forecast event into a capacity utilization newsletter.
//!
//! # Features
//!
//! - Unwraps the forecast document and bidding zone from the event envelope
//! - Fetches installed capacity with fixed-delay retries
//! - Keeps full-hour forecast rows and joins them with installed capacity
//! - Renders a text bar chart and an HTML table
//! - Sends one email per subscriber, concurrently, retrying the stage as a whole
//!
//! # Architecture
//!
//! ```text
//! Raw event (file or stdin)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         PIPELINE                            │
//! │                                                             │
//! │  1. Extract payload and region code                         │
//! │         ↓                                                   │
//! │  2. Fetch installed capacity (entsoe-client, retried)       │
//! │         ↓                                                   │
//! │  3. Decode forecast, keep full hours                        │
//! │         ↓                                                   │
//! │  4. Build report (join, percentage, bar chart)              │
//! │         ↓                                                   │
//! │  5. Load recipients, send newsletters (broadcaster)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dataflow::{EnvCredentials, EnvUserDirectory, Pipeline, PipelineConfig};
//!
//! # async fn example(raw_event: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::from_credentials(
//!     &EnvCredentials,
//!     Arc::new(EnvUserDirectory::default()),
//!     PipelineConfig::from_env()?,
//! )
//! .await?;
//!
//! let summary = pipeline.run(raw_event).await?;
//! println!("{}", summary.report.chart_text());
//! # Ok(())
//! # }
//! ```

pub mod capacity;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod forecast;
pub mod payload;
pub mod pipeline;
pub mod report;
pub mod retry;

pub use capacity::{capacity_window, CapacityFetcher, CapacitySource};
pub use config::PipelineConfig;
pub use credentials::{CredentialsProvider, EnvCredentials};
pub use directory::{EnvUserDirectory, JsonFileDirectory, StaticDirectory, User, UserDirectory};
pub use dispatch::{compose_email, DispatchSummary, Dispatcher, FailedRecipient};
pub use error::{
    CapacityError, ConfigError, DirectoryError, DispatchError, ForecastError, PipelineError,
};
pub use forecast::{canonical_generation_type, parse_generation};
pub use payload::{extract_event_payload, extract_region_code, strip_envelope_tail};
pub use pipeline::{Pipeline, RunStage, RunSummary};
pub use report::{build_report, chart_line, utilization_percentage, JoinedRow, ReportTable, UtilizationReport};
pub use retry::RetryPolicy;
