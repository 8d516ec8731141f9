//! Capacity utilization report: a joined table plus a text bar chart.

use askama::Template;
use chrono::{DateTime, Utc};
use entsoe_client::{GenerationSeries, InstalledCapacity};
use tracing::{debug, info};

use crate::forecast::canonical_generation_type;

/// Characters in a chart bar.
pub const BAR_WIDTH: usize = 100;
/// Title used when the forecast has no columns at all.
pub const UNKNOWN_TYPE: &str = "unknown generation";
/// Second chart line of a degraded report.
pub const RAW_DATA_NOTICE: &str = "the raw subscription data follows below";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// One forecast row joined with installed capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub timestamp: DateTime<Utc>,
    /// Forecast generation in MW.
    pub forecast: f64,
    /// Installed capacity in MW.
    pub installed: f64,
    /// Rounded `forecast / installed` in percent.
    pub percentage: i64,
}

/// Table part of a report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportTable {
    /// Forecast joined with capacity.
    Joined(Vec<JoinedRow>),
    /// The forecast as received, when no capacity could be joined.
    Raw(GenerationSeries),
}

/// A finished report for one generation type.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilizationReport {
    /// Canonical generation type the report is about.
    pub title: String,
    pub chart: Vec<String>,
    pub table: ReportTable,
}

impl UtilizationReport {
    /// Whether capacity was missing and the raw forecast is attached instead.
    pub fn is_degraded(&self) -> bool {
        matches!(self.table, ReportTable::Raw(_))
    }

    /// Chart lines joined by newlines.
    pub fn chart_text(&self) -> String {
        self.chart.join("\n")
    }
}

/// Rounded utilization in percent. Zero or negative capacity counts as fully used.
pub fn utilization_percentage(forecast: f64, installed: f64) -> i64 {
    if installed <= 0.0 {
        return 100;
    }
    (forecast / installed * 100.0).round() as i64
}

/// Render one chart line.
///
/// The bar is always [`BAR_WIDTH`] characters, with the filled part clamped to
/// the bar. The printed percentage is not clamped.
pub fn chart_line(row: &JoinedRow) -> String {
    let filled = row.percentage.clamp(0, BAR_WIDTH as i64) as usize;
    format!(
        "{} | {}{}  => {}% ({}MW/{}MW)",
        format_timestamp(row.timestamp),
        "#".repeat(filled),
        "_".repeat(BAR_WIDTH - filled),
        row.percentage,
        row.forecast,
        row.installed
    )
}

/// Join the forecast's leading column with installed capacity.
///
/// When the capacity has no entry for the forecast's type (or the forecast is
/// empty), the report degrades to a two-line notice and carries the raw forecast.
pub fn build_report(generation: GenerationSeries, capacity: &InstalledCapacity) -> UtilizationReport {
    let Some(leading) = generation.leading_column() else {
        info!("Forecast has no generation columns");
        return degraded(UNKNOWN_TYPE.to_string(), generation);
    };
    let title = canonical_generation_type(leading);

    let installed = match capacity.representative(&title) {
        Some(installed) if !generation.is_empty() => installed,
        _ => {
            info!(generation_type = %title, "No installed capacity to join");
            return degraded(title, generation);
        }
    };

    let rows: Vec<JoinedRow> = generation
        .column_values(0)
        .filter_map(|(timestamp, value)| {
            value.map(|forecast| JoinedRow {
                timestamp,
                forecast,
                installed,
                percentage: utilization_percentage(forecast, installed),
            })
        })
        .collect();

    debug!(generation_type = %title, rows = rows.len(), installed, "Built utilization report");

    UtilizationReport {
        title,
        chart: rows.iter().map(chart_line).collect(),
        table: ReportTable::Joined(rows),
    }
}

fn degraded(title: String, generation: GenerationSeries) -> UtilizationReport {
    UtilizationReport {
        chart: vec![
            format!("capacity for {} not available", title),
            RAW_DATA_NOTICE.to_string(),
        ],
        title,
        table: ReportTable::Raw(generation),
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

impl ReportTable {
    /// Number of data rows.
    pub fn len(&self) -> usize {
        match self {
            ReportTable::Joined(rows) => rows.len(),
            ReportTable::Raw(series) => series.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Template view of the table, one row per timestamp.
    pub fn html(&self) -> TableHtml {
        match self {
            ReportTable::Joined(rows) => TableHtml {
                headers: ["forecast [MW]", "installed [MW]", "utilization [%]"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                rows: rows
                    .iter()
                    .map(|row| TableHtmlRow {
                        timestamp: format_timestamp(row.timestamp),
                        cells: vec![
                            row.forecast.to_string(),
                            row.installed.to_string(),
                            row.percentage.to_string(),
                        ],
                    })
                    .collect(),
            },
            ReportTable::Raw(series) => TableHtml {
                headers: series.columns().iter().map(ToString::to_string).collect(),
                rows: series
                    .rows()
                    .iter()
                    .map(|row| TableHtmlRow {
                        timestamp: format_timestamp(row.timestamp),
                        cells: row
                            .values
                            .iter()
                            .map(|v| v.map(|v| v.to_string()).unwrap_or_else(|| "NaN".to_string()))
                            .collect(),
                    })
                    .collect(),
            },
        }
    }

    /// Render as an HTML table.
    pub fn to_html(&self) -> askama::Result<String> {
        self.html().render()
    }
}

/// HTML table template.
#[derive(Debug, Clone, PartialEq, Template)]
#[template(path = "report_table.html")]
pub struct TableHtml {
    pub headers: Vec<String>,
    pub rows: Vec<TableHtmlRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableHtmlRow {
    pub timestamp: String,
    pub cells: Vec<String>,
}
