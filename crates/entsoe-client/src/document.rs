//! XML codec for generation and installed capacity market documents.
//!
//! Both the day-ahead/intraday generation forecasts and the installed
//! capacity per production type arrive as `GL_MarketDocument`s: a list of
//! `TimeSeries`, each carrying a production type, a bidding-zone direction
//! and one or more `Period`s of positioned `Point`s.

use chrono::{DateTime, Months, NaiveDateTime, TimeDelta, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::psr::psr_name;
use crate::series::{ColumnKey, GenerationSeries};
use crate::EntsoeError;

/// Classification of series reported for a bidding zone.
pub const AGGREGATED: &str = "Actual Aggregated";
/// Classification of series reported out of a bidding zone.
pub const CONSUMPTION: &str = "Actual Consumption";

#[derive(Debug, Deserialize)]
struct GlMarketDocument {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Deserialize)]
struct TimeSeries {
    #[serde(rename = "inBiddingZone_Domain.mRID")]
    in_domain: Option<DomainMrid>,
    #[serde(rename = "outBiddingZone_Domain.mRID")]
    out_domain: Option<DomainMrid>,
    #[serde(rename = "MktPSRType")]
    psr: Option<MktPsrType>,
    #[serde(rename = "Period", default)]
    periods: Vec<Period>,
}

#[derive(Debug, Deserialize)]
struct DomainMrid {
    #[serde(rename = "$text")]
    #[allow(dead_code)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct MktPsrType {
    #[serde(rename = "psrType")]
    psr_type: String,
}

#[derive(Debug, Deserialize)]
struct Period {
    #[serde(rename = "timeInterval")]
    time_interval: TimeInterval,
    resolution: String,
    #[serde(rename = "Point", default)]
    points: Vec<Point>,
}

#[derive(Debug, Deserialize)]
struct TimeInterval {
    start: String,
}

#[derive(Debug, Deserialize)]
struct Point {
    position: u32,
    quantity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AcknowledgementDocument {
    #[serde(rename = "Reason", default)]
    reasons: Vec<Reason>,
}

#[derive(Debug, Deserialize)]
struct Reason {
    text: Option<String>,
}

impl TimeSeries {
    fn column_key(&self) -> ColumnKey {
        let kind = match &self.psr {
            Some(psr) => psr_name(&psr.psr_type)
                .map(str::to_string)
                .unwrap_or_else(|| psr.psr_type.trim().to_string()),
            None => "Unknown".to_string(),
        };

        if self.in_domain.is_some() {
            ColumnKey::composite(kind, AGGREGATED)
        } else if self.out_domain.is_some() {
            ColumnKey::composite(kind, CONSUMPTION)
        } else {
            ColumnKey::simple(kind)
        }
    }
}

/// Spacing between consecutive points of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Minutes(i64),
    Days(i64),
    Months(u32),
}

impl Resolution {
    /// Parse an ISO 8601 duration such as `PT15M`, `PT1H`, `P1D` or `P1Y`.
    pub fn parse(value: &str) -> Result<Self, EntsoeError> {
        let value = value.trim();
        let invalid = || EntsoeError::Decode(format!("unsupported resolution '{}'", value));

        let resolution = if let Some(time) = value.strip_prefix("PT") {
            if let Some(n) = time.strip_suffix('M') {
                Resolution::Minutes(n.parse::<i64>().map_err(|_| invalid())?)
            } else if let Some(n) = time.strip_suffix('H') {
                Resolution::Minutes(n.parse::<i64>().map_err(|_| invalid())? * 60)
            } else {
                return Err(invalid());
            }
        } else if let Some(date) = value.strip_prefix('P') {
            if let Some(n) = date.strip_suffix('D') {
                Resolution::Days(n.parse::<i64>().map_err(|_| invalid())?)
            } else if let Some(n) = date.strip_suffix('W') {
                Resolution::Days(n.parse::<i64>().map_err(|_| invalid())? * 7)
            } else if let Some(n) = date.strip_suffix('M') {
                Resolution::Months(n.parse::<u32>().map_err(|_| invalid())?)
            } else if let Some(n) = date.strip_suffix('Y') {
                Resolution::Months(n.parse::<u32>().map_err(|_| invalid())? * 12)
            } else {
                return Err(invalid());
            }
        } else {
            return Err(invalid());
        };

        match resolution {
            Resolution::Minutes(n) | Resolution::Days(n) if n <= 0 => Err(invalid()),
            Resolution::Months(0) => Err(invalid()),
            _ => Ok(resolution),
        }
    }

    /// Timestamp `steps` resolutions after `start`.
    pub fn step(&self, start: DateTime<Utc>, steps: u32) -> Option<DateTime<Utc>> {
        match *self {
            Resolution::Minutes(n) => {
                start.checked_add_signed(TimeDelta::try_minutes(n.checked_mul(i64::from(steps))?)?)
            }
            Resolution::Days(n) => {
                start.checked_add_signed(TimeDelta::try_days(n.checked_mul(i64::from(steps))?)?)
            }
            Resolution::Months(n) => start.checked_add_months(Months::new(n.checked_mul(steps)?)),
        }
    }
}

/// Parse a document timestamp (`2024-01-01T23:00Z` or RFC 3339).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, EntsoeError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%MZ")
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| EntsoeError::Decode(format!("invalid timestamp '{}': {}", value, e)))
}

/// Decode a `GL_MarketDocument` into a generation table.
///
/// Each point lands at `start + (position - 1) * resolution`. Points without a
/// quantity are skipped.
pub fn parse_generation(xml: &str) -> Result<GenerationSeries, EntsoeError> {
    let xml = xml.trim();
    if xml.is_empty() {
        return Err(EntsoeError::Decode("empty document".to_string()));
    }

    let document: GlMarketDocument = quick_xml::de::from_str(xml)?;

    let mut points = Vec::new();
    for series in &document.time_series {
        let key = series.column_key();
        for period in &series.periods {
            let start = parse_timestamp(&period.time_interval.start)?;
            let resolution = Resolution::parse(&period.resolution)?;

            for point in &period.points {
                let Some(quantity) = point.quantity else {
                    continue;
                };
                let timestamp = resolution
                    .step(start, point.position.saturating_sub(1))
                    .ok_or_else(|| {
                        EntsoeError::Decode(format!("point position {} out of range", point.position))
                    })?;
                points.push((key.clone(), timestamp, quantity));
            }
        }
    }

    debug!(
        time_series = document.time_series.len(),
        points = points.len(),
        "Decoded generation document"
    );

    Ok(GenerationSeries::from_points(points))
}

/// Reason text of an `Acknowledgement_MarketDocument`, if `xml` is one.
///
/// The API answers queries it cannot serve (e.g. "No matching data found")
/// with an acknowledgement instead of a market document.
pub fn acknowledgement_reason(xml: &str) -> Option<String> {
    if !xml.contains("Acknowledgement_MarketDocument") {
        return None;
    }
    let document: AcknowledgementDocument = quick_xml::de::from_str(xml.trim()).ok()?;
    let text = document
        .reasons
        .into_iter()
        .filter_map(|r| r.text)
        .collect::<Vec<_>>()
        .join("; ");
    Some(text)
}
