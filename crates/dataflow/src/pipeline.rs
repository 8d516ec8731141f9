//! Run orchestration.

use std::fmt;
use std::sync::Arc;

use broadcaster::Broadcaster;
use entsoe_client::{EntsoeClient, EntsoeConfig, GenerationSeries};
use mailer::{MailTransport, SmtpConfig, SmtpMailer};
use tracing::{error, info, instrument, warn};

use crate::capacity::{CapacityFetcher, CapacitySource};
use crate::config::PipelineConfig;
use crate::credentials::CredentialsProvider;
use crate::directory::UserDirectory;
use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::error::{ConfigError, DispatchError, PipelineError};
use crate::forecast;
use crate::payload::{extract_event_payload, extract_region_code};
use crate::report::{build_report, UtilizationReport};

/// Stages of a run, in order. `Failed` can follow any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStage {
    Received,
    PayloadExtracted,
    RegionResolved,
    CapacityFetched,
    ReportBuilt,
    Dispatched,
    Done,
    Failed,
}

impl RunStage {
    /// The stage a successful step leads to.
    pub fn next(self) -> Option<RunStage> {
        match self {
            RunStage::Received => Some(RunStage::PayloadExtracted),
            RunStage::PayloadExtracted => Some(RunStage::RegionResolved),
            RunStage::RegionResolved => Some(RunStage::CapacityFetched),
            RunStage::CapacityFetched => Some(RunStage::ReportBuilt),
            RunStage::ReportBuilt => Some(RunStage::Dispatched),
            RunStage::Dispatched => Some(RunStage::Done),
            RunStage::Done | RunStage::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Done | RunStage::Failed)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Received => "received",
            RunStage::PayloadExtracted => "payload_extracted",
            RunStage::RegionResolved => "region_resolved",
            RunStage::CapacityFetched => "capacity_fetched",
            RunStage::ReportBuilt => "report_built",
            RunStage::Dispatched => "dispatched",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks and logs the stage of one run.
#[derive(Debug)]
struct RunState {
    stage: RunStage,
}

impl RunState {
    fn new() -> Self {
        info!(stage = %RunStage::Received, "Run started");
        Self {
            stage: RunStage::Received,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            info!(from = %self.stage, to = %next, "Stage transition");
            self.stage = next;
        }
    }

    fn fail(&mut self, error: &PipelineError) {
        if self.stage.is_terminal() {
            warn!(stage = %self.stage, error = %error, "Failure reported after the run ended");
            return;
        }
        error!(from = %self.stage, failed_stage = %error.failed_stage(), error = %error, "Run failed");
        self.stage = RunStage::Failed;
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Bidding zone code, empty when the event had none.
    pub region: String,
    pub report: UtilizationReport,
    pub dispatch: DispatchSummary,
    pub stage: RunStage,
}

/// The newsletter pipeline.
///
/// Holds no per-run state; share it behind an `Arc` to serve concurrent runs.
pub struct Pipeline {
    capacity: CapacityFetcher,
    directory: Arc<dyn UserDirectory>,
    dispatcher: Dispatcher,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        capacity_source: Arc<dyn CapacitySource>,
        directory: Arc<dyn UserDirectory>,
        transport: Arc<dyn MailTransport>,
        config: PipelineConfig,
    ) -> Self {
        let broadcaster = Broadcaster::new(transport).with_max_in_flight(config.max_concurrent_sends);
        Self {
            capacity: CapacityFetcher::new(capacity_source, config.capacity_retry),
            directory,
            dispatcher: Dispatcher::new(broadcaster),
            config,
        }
    }

    /// Build the pipeline with the capacity API client and SMTP relay,
    /// configured from the environment and the given credentials.
    pub async fn from_credentials(
        credentials: &dyn CredentialsProvider,
        directory: Arc<dyn UserDirectory>,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        let api_key = credentials.entsoe_api_key().await?;
        let client = EntsoeClient::new(EntsoeConfig::from_env(api_key)?)?;

        let smtp_credentials = credentials.smtp_credentials().await?;
        let mailer = SmtpMailer::new(SmtpConfig::from_env(smtp_credentials)?)?;

        Ok(Self::new(Arc::new(client), directory, Arc::new(mailer), config))
    }

    /// Process one event from receipt to dispatch.
    #[instrument(skip_all)]
    pub async fn run(&self, raw_event: &str) -> Result<RunSummary, PipelineError> {
        let mut state = RunState::new();

        let payload = extract_event_payload(raw_event);
        if payload.is_empty() {
            warn!("Event carries no payload");
        }
        state.advance();

        let region = extract_region_code(raw_event);
        if region.is_empty() {
            warn!("Event carries no region code");
        } else {
            info!(region = %region, "Region resolved");
        }
        state.advance();

        let capacity = match self.capacity.fetch_installed_capacity(&region).await {
            Ok(capacity) => capacity,
            Err(e) => {
                let e = PipelineError::from(e);
                state.fail(&e);
                return Err(e);
            }
        };
        state.advance();

        let generation = forecast::parse_generation(payload).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable forecast payload, continuing with an empty series");
            GenerationSeries::new()
        });
        let report = build_report(generation, &capacity);
        info!(
            generation_type = %report.title,
            degraded = report.is_degraded(),
            rows = report.table.len(),
            "Report built"
        );
        state.advance();

        let dispatch = match self.dispatch(&report, &region).await {
            Ok(summary) => summary,
            Err(e) => {
                let e = PipelineError::from(e);
                state.fail(&e);
                return Err(e);
            }
        };
        state.advance();
        state.advance();

        Ok(RunSummary {
            region,
            report,
            dispatch,
            stage: state.stage,
        })
    }

    /// Load recipients and send, retrying the whole stage.
    async fn dispatch(&self, report: &UtilizationReport, region: &str) -> Result<DispatchSummary, DispatchError> {
        let directory = self.directory.as_ref();
        let dispatcher = &self.dispatcher;

        self.config
            .dispatch_retry
            .run(
                "newsletter dispatch",
                move |attempt| async move {
                    let users = directory.list_users().await?;
                    info!(attempt, users = users.len(), "Dispatching newsletter");
                    dispatcher.dispatch(report, region, &users).await
                },
                |e: &DispatchError| !matches!(e, DispatchError::Render(_)),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stage = RunStage::Received;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(
            visited,
            vec![
                RunStage::Received,
                RunStage::PayloadExtracted,
                RunStage::RegionResolved,
                RunStage::CapacityFetched,
                RunStage::ReportBuilt,
                RunStage::Dispatched,
                RunStage::Done,
            ]
        );
        assert!(RunStage::Done.is_terminal());
        assert!(RunStage::Failed.is_terminal());
        assert_eq!(RunStage::Failed.next(), None);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(RunStage::CapacityFetched.to_string(), "capacity_fetched");
    }

    #[test]
    fn test_run_state_advances_and_fails() {
        let mut state = RunState::new();
        state.advance();
        assert_eq!(state.stage, RunStage::PayloadExtracted);

        let error = PipelineError::Dispatch(DispatchError::AllFailed { attempted: 2 });
        state.fail(&error);
        assert_eq!(state.stage, RunStage::Failed);
        state.advance();
        assert_eq!(state.stage, RunStage::Failed);
    }

    #[test]
    fn test_finished_run_stays_done() {
        let mut state = RunState::new();
        while !state.stage.is_terminal() {
            state.advance();
        }
        assert_eq!(state.stage, RunStage::Done);

        let error = PipelineError::Dispatch(DispatchError::AllFailed { attempted: 1 });
        state.fail(&error);
        assert_eq!(state.stage, RunStage::Done);
    }
}
