//! Transparency platform HTTP client.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use crate::config::EntsoeConfig;
use crate::document::{acknowledgement_reason, parse_generation};
use crate::error::EntsoeError;
use crate::series::InstalledCapacity;

/// Document type for installed generation capacity per production type.
const DOC_INSTALLED_CAPACITY: &str = "A68";
/// Process type "year ahead".
const PROCESS_YEAR_AHEAD: &str = "A33";

/// Client for querying the ENTSO-E transparency platform.
#[derive(Clone)]
pub struct EntsoeClient {
    http: Client,
    config: EntsoeConfig,
}

impl EntsoeClient {
    /// Create a new client. No request is made until a query is issued.
    pub fn new(config: EntsoeConfig) -> Result<Self, EntsoeError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(EntsoeError::Http)?;

        info!(base_url = %config.base_url, "Created ENTSO-E client");

        Ok(Self { http, config })
    }

    /// Installed generation capacity per production type for `area` in `[start, end]`.
    #[instrument(skip(self), fields(area = %area))]
    pub async fn installed_generation_capacity(
        &self,
        area: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<InstalledCapacity, EntsoeError> {
        let params = [
            ("documentType", DOC_INSTALLED_CAPACITY.to_string()),
            ("processType", PROCESS_YEAR_AHEAD.to_string()),
            ("in_Domain", area.to_string()),
            ("periodStart", format_period(start)),
            ("periodEnd", format_period(end)),
        ];

        let body = self.query(&params).await?;
        let series = parse_generation(&body)?;
        let capacity = InstalledCapacity::from_series(&series);

        debug!(types = capacity.len(), "Installed capacity received");
        Ok(capacity)
    }

    /// Get the configuration.
    pub fn config(&self) -> &EntsoeConfig {
        &self.config
    }

    /// Issue a GET against the API endpoint and return the body of a successful response.
    async fn query(&self, params: &[(&str, String)]) -> Result<String, EntsoeError> {
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[("securityToken", self.config.api_key())])
            .query(params)
            .send()
            .await
            .map_err(EntsoeError::Http)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(EntsoeError::Unauthorized);
        }

        let body = response.text().await.map_err(EntsoeError::Http)?;

        if !status.is_success() {
            if let Some(reason) = acknowledgement_reason(&body) {
                if reason.contains("No matching data") {
                    return Err(EntsoeError::NoMatchingData(reason));
                }
                warn!(status = status.as_u16(), reason = %reason, "Query rejected");
            }
            return Err(EntsoeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

/// Period bounds are sent as UTC `yyyyMMddHHmm`.
fn format_period(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y%m%d%H%M").to_string()
}

impl std::fmt::Debug for EntsoeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntsoeClient")
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_period() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(format_period(ts), "202312312300");
    }
}
