//! Installed capacity lookup for a bidding zone.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::{Europe::Brussels, Tz};
use entsoe_client::{EntsoeClient, EntsoeError, InstalledCapacity};
use tracing::{debug, error, info, instrument, warn};

use crate::error::CapacityError;
use crate::retry::RetryPolicy;

/// Zone the capacity window is computed in.
pub const REFERENCE_TZ: Tz = Brussels;

/// Anything that can answer installed capacity queries.
#[async_trait]
pub trait CapacitySource: Send + Sync {
    async fn installed_capacity(
        &self,
        region: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<InstalledCapacity, EntsoeError>;
}

#[async_trait]
impl CapacitySource for EntsoeClient {
    async fn installed_capacity(
        &self,
        region: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<InstalledCapacity, EntsoeError> {
        self.installed_generation_capacity(region, start, end).await
    }
}

/// Query window for a capacity lookup made at `now`: from January 1st of the
/// current year up to `now`.
pub fn capacity_window(now: DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    // Midnight on January 1st exists in every European zone.
    let start = tz
        .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
        .earliest()
        .unwrap_or(now);
    (start.with_timezone(&Utc), now.with_timezone(&Utc))
}

/// Fetches installed capacity with retries.
///
/// Outcomes:
/// - empty region code: no request, empty capacity
/// - transient failures: retried per the policy, fatal when exhausted
/// - rejected credentials or "no matching data": empty capacity, run continues
/// - any other API error: fatal, not retried
#[derive(Clone)]
pub struct CapacityFetcher {
    source: Arc<dyn CapacitySource>,
    retry: RetryPolicy,
}

impl CapacityFetcher {
    pub fn new(source: Arc<dyn CapacitySource>, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Installed capacity for `region` as of now.
    pub async fn fetch_installed_capacity(&self, region: &str) -> Result<InstalledCapacity, CapacityError> {
        self.fetch_at(region, Utc::now().with_timezone(&REFERENCE_TZ))
            .await
    }

    /// Installed capacity for `region` with the window anchored at `now`.
    #[instrument(skip(self, now))]
    pub async fn fetch_at(&self, region: &str, now: DateTime<Tz>) -> Result<InstalledCapacity, CapacityError> {
        if region.trim().is_empty() {
            warn!("No region code in event, skipping capacity lookup");
            return Ok(InstalledCapacity::empty());
        }

        let (start, end) = capacity_window(now);
        debug!(%start, %end, "Querying installed capacity");

        let source = self.source.as_ref();
        let result = self
            .retry
            .run(
                "installed capacity",
                move |attempt| {
                    debug!(attempt, "Capacity request");
                    source.installed_capacity(region, start, end)
                },
                EntsoeError::is_transient,
            )
            .await;

        match result {
            Ok(capacity) => {
                info!(types = capacity.len(), "Installed capacity fetched");
                Ok(capacity)
            }
            Err(e) if e.is_unauthorized() => {
                error!("Capacity API rejected the credentials, continuing without capacity");
                Ok(InstalledCapacity::empty())
            }
            Err(EntsoeError::NoMatchingData(reason)) => {
                warn!(reason = %reason, "No installed capacity published for region");
                Ok(InstalledCapacity::empty())
            }
            Err(e) => Err(CapacityError::Fetch(e)),
        }
    }
}
