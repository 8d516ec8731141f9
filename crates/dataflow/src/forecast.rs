//! Forecast payload decoding.

use chrono::Timelike;
use entsoe_client::{ColumnKey, GenerationSeries};
use tracing::{debug, warn};

use crate::error::ForecastError;
use crate::payload::strip_envelope_tail;

/// Decode a forecast payload, keeping only rows on the full hour.
///
/// An empty payload is not an error; it yields an empty series. The payload
/// may still carry the envelope's closing elements.
pub fn parse_generation(xml_payload: &str) -> Result<GenerationSeries, ForecastError> {
    let document = strip_envelope_tail(xml_payload).trim();
    if document.is_empty() {
        warn!("Empty forecast payload");
        return Ok(GenerationSeries::new());
    }

    let mut series = entsoe_client::parse_generation(document)?;
    let decoded = series.len();
    series.retain_rows(|row| row.timestamp.minute() == 0);

    debug!(
        decoded,
        kept = series.len(),
        columns = series.columns().len(),
        "Filtered forecast to full hours"
    );
    Ok(series)
}

/// Whether a column classification marks aggregated generation.
pub fn is_aggregated(classification: &str) -> bool {
    classification.to_lowercase().contains("aggregated")
}

/// The generation type name a column is joined on.
///
/// Aggregated composites collapse to their production type; any other
/// composite keeps its full `kind (classification)` label.
pub fn canonical_generation_type(key: &ColumnKey) -> String {
    match key.classification() {
        Some(classification) if is_aggregated(classification) => key.kind().to_string(),
        _ => key.to_string(),
    }
}
