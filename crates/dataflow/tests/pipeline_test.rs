//! End-to-end runs of the pipeline against in-memory collaborators.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entsoe_client::{EntsoeError, InstalledCapacity};
use mailer::{Email, MailError, MailTransport};

use dataflow::{
    CapacitySource, DirectoryError, DispatchError, Pipeline, PipelineConfig, PipelineError, ReportTable,
    RetryPolicy, RunStage, StaticDirectory, User, UserDirectory,
};

const EVENT: &str = include_str!("fixtures/generation_event.txt");

/// Capacity API stand-in: fails with the scripted errors first, then answers.
struct FakeCapacity {
    capacity: InstalledCapacity,
    failures: Mutex<Vec<EntsoeError>>,
    regions: Mutex<Vec<String>>,
}

impl FakeCapacity {
    fn new(capacity: InstalledCapacity) -> Self {
        Self {
            capacity,
            failures: Mutex::new(Vec::new()),
            regions: Mutex::new(Vec::new()),
        }
    }

    fn failing_with(self, failures: Vec<EntsoeError>) -> Self {
        *self.failures.lock().unwrap() = failures;
        self
    }

    fn calls(&self) -> usize {
        self.regions.lock().unwrap().len()
    }
}

#[async_trait]
impl CapacitySource for FakeCapacity {
    async fn installed_capacity(
        &self,
        region: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<InstalledCapacity, EntsoeError> {
        self.regions.lock().unwrap().push(region.to_string());
        let mut failures = self.failures.lock().unwrap();
        if failures.is_empty() {
            Ok(self.capacity.clone())
        } else {
            Err(failures.remove(0))
        }
    }
}

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<Email>>,
    fail_all: bool,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if self.fail_all {
            return Err(MailError::Send("relay down".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Fails the first `failures` listings.
struct FlakyDirectory {
    failures: u32,
    calls: AtomicU32,
    users: Vec<User>,
}

#[async_trait]
impl UserDirectory for FlakyDirectory {
    async fn list_users(&self) -> Result<Vec<User>, DirectoryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(DirectoryError::Invalid("directory offline".to_string()))
        } else {
            Ok(self.users.clone())
        }
    }
}

fn users() -> Vec<User> {
    vec![
        User::new("Ada", "ada@example.org"),
        User::new("Grace", "grace@example.org"),
    ]
}

fn offshore(mw: f64) -> InstalledCapacity {
    [("Wind Offshore", vec![mw])].into_iter().collect()
}

fn config() -> PipelineConfig {
    PipelineConfig::default().with_retry(RetryPolicy::new(3, Duration::from_millis(1)))
}

fn pipeline(
    capacity: Arc<FakeCapacity>,
    directory: Arc<dyn UserDirectory>,
    transport: Arc<RecordingTransport>,
) -> Pipeline {
    Pipeline::new(capacity, directory, transport, config())
}

#[tokio::test]
async fn test_forecast_joined_with_capacity() {
    let capacity = Arc::new(FakeCapacity::new(offshore(1000.0)));
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(
        capacity.clone(),
        Arc::new(StaticDirectory::new(users())),
        transport.clone(),
    );

    let summary = pipeline.run(EVENT).await.unwrap();

    assert_eq!(summary.stage, RunStage::Done);
    assert_eq!(summary.region, "10Y1001A1001A82H");
    assert_eq!(*capacity.regions.lock().unwrap(), vec!["10Y1001A1001A82H".to_string()]);

    let report = &summary.report;
    assert_eq!(report.title, "Wind Offshore");
    assert_eq!(report.chart.len(), 1);
    assert!(report.chart[0].starts_with("2024-03-01 00:00:00+00:00 | "));
    assert!(report.chart[0].contains("50%"));
    match &report.table {
        ReportTable::Joined(rows) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].percentage, 50);
        }
        other => panic!("expected joined table, got {:?}", other),
    }

    assert_eq!(summary.dispatch.delivered.len(), 2);
    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    for email in sent.iter() {
        assert_eq!(
            email.subject,
            "Newsletter: Intraday Generation Forecasts Wind Offshore (Germany-Luxembourg)"
        );
        assert!(email.html_body.as_deref().unwrap_or_default().contains("50%"));
    }
}

#[tokio::test]
async fn test_rejected_credentials_still_send_raw_data() {
    let capacity = Arc::new(FakeCapacity::new(offshore(1000.0)).failing_with(vec![EntsoeError::Unauthorized]));
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(
        capacity.clone(),
        Arc::new(StaticDirectory::new(users())),
        transport.clone(),
    );

    let summary = pipeline.run(EVENT).await.unwrap();

    assert_eq!(capacity.calls(), 1);
    assert!(summary.report.is_degraded());
    assert_eq!(
        summary.report.chart,
        vec![
            "capacity for Wind Offshore not available".to_string(),
            "the raw subscription data follows below".to_string(),
        ]
    );
    assert_eq!(summary.report.table.len(), 1);
    assert_eq!(transport.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_transient_capacity_failures_recover() {
    let transient = || EntsoeError::Status {
        status: 502,
        body: String::new(),
    };
    let capacity = Arc::new(FakeCapacity::new(offshore(1000.0)).failing_with(vec![transient(), transient()]));
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(
        capacity.clone(),
        Arc::new(StaticDirectory::new(users())),
        transport,
    );

    let summary = pipeline.run(EVENT).await.unwrap();

    assert_eq!(capacity.calls(), 3);
    assert!(!summary.report.is_degraded());
}

#[tokio::test]
async fn test_exhausted_capacity_retries_fail_the_run() {
    let transient = || EntsoeError::Status {
        status: 503,
        body: String::new(),
    };
    let capacity = Arc::new(
        FakeCapacity::new(offshore(1000.0)).failing_with(vec![transient(), transient(), transient()]),
    );
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(
        capacity.clone(),
        Arc::new(StaticDirectory::new(users())),
        transport.clone(),
    );

    let error = pipeline.run(EVENT).await.unwrap_err();

    assert!(matches!(error, PipelineError::Capacity(_)));
    assert_eq!(error.failed_stage(), RunStage::CapacityFetched);
    assert_eq!(capacity.calls(), 3);
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_event_without_payload_or_region() {
    let capacity = Arc::new(FakeCapacity::new(offshore(1000.0)));
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(
        capacity.clone(),
        Arc::new(StaticDirectory::new(users())),
        transport.clone(),
    );

    let summary = pipeline.run("<msg:Event>heartbeat</msg:Event>").await.unwrap();

    assert_eq!(capacity.calls(), 0);
    assert_eq!(summary.region, "");
    assert!(summary.report.is_degraded());
    assert!(summary.report.table.is_empty());

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].subject.ends_with("(unknown region)"));
}

#[tokio::test]
async fn test_malformed_forecast_degrades() {
    let event = "<msg:Payload><inBiddingZone_Domain.mRID>10YBE----------2</inBiddingZone_Domain.mRID>\
        <GL_MarketDocument><TimeSeries></msg:Payload>";
    let capacity = Arc::new(FakeCapacity::new(offshore(1000.0)));
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(
        capacity.clone(),
        Arc::new(StaticDirectory::new(users())),
        transport,
    );

    let summary = pipeline.run(event).await.unwrap();

    assert_eq!(summary.region, "10YBE----------2");
    assert!(summary.report.is_degraded());
}

#[tokio::test]
async fn test_directory_is_retried_with_the_stage() {
    let capacity = Arc::new(FakeCapacity::new(offshore(1000.0)));
    let transport = Arc::new(RecordingTransport::default());
    let directory = Arc::new(FlakyDirectory {
        failures: 2,
        calls: AtomicU32::new(0),
        users: users(),
    });
    let pipeline = pipeline(capacity, directory.clone(), transport.clone());

    let summary = pipeline.run(EVENT).await.unwrap();

    assert_eq!(directory.calls.load(Ordering::SeqCst), 3);
    assert_eq!(summary.dispatch.delivered.len(), 2);
    assert_eq!(transport.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_all_sends_failing_fails_the_run() {
    let capacity = Arc::new(FakeCapacity::new(offshore(1000.0)));
    let transport = Arc::new(RecordingTransport {
        fail_all: true,
        ..Default::default()
    });
    let directory = Arc::new(FlakyDirectory {
        failures: 0,
        calls: AtomicU32::new(0),
        users: users(),
    });
    let pipeline = pipeline(capacity, directory.clone(), transport);

    let error = pipeline.run(EVENT).await.unwrap_err();

    assert!(matches!(
        error,
        PipelineError::Dispatch(DispatchError::AllFailed { attempted: 2 })
    ));
    assert_eq!(error.failed_stage(), RunStage::Dispatched);
    assert_eq!(directory.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_zero_installed_capacity_reads_as_full() {
    let capacity = Arc::new(FakeCapacity::new(offshore(0.0)));
    let transport = Arc::new(RecordingTransport::default());
    let pipeline = pipeline(capacity, Arc::new(StaticDirectory::new(users())), transport);

    let summary = pipeline.run(EVENT).await.unwrap();

    assert!(summary.report.chart[0].contains("=> 100%"));
}
