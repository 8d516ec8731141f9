//! Time series types decoded from transparency platform documents.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};

/// Column key of a generation table.
///
/// Documents that carry a bidding-zone direction produce composite keys such as
/// `("Wind Offshore", "Actual Aggregated")`; everything else gets a simple key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    /// A plain production type name.
    Simple(String),
    /// A production type paired with a classification label.
    Composite { kind: String, classification: String },
}

impl ColumnKey {
    /// Create a simple key.
    pub fn simple(kind: impl Into<String>) -> Self {
        ColumnKey::Simple(kind.into())
    }

    /// Create a composite key.
    pub fn composite(kind: impl Into<String>, classification: impl Into<String>) -> Self {
        ColumnKey::Composite {
            kind: kind.into(),
            classification: classification.into(),
        }
    }

    /// The production type component.
    pub fn kind(&self) -> &str {
        match self {
            ColumnKey::Simple(kind) => kind,
            ColumnKey::Composite { kind, .. } => kind,
        }
    }

    /// The classification label, if this is a composite key.
    pub fn classification(&self) -> Option<&str> {
        match self {
            ColumnKey::Simple(_) => None,
            ColumnKey::Composite { classification, .. } => Some(classification),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Simple(kind) => write!(f, "{}", kind),
            ColumnKey::Composite {
                kind,
                classification,
            } => write!(f, "{} ({})", kind, classification),
        }
    }
}

/// One timestamp of a generation table. `values` is aligned with the table's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRow {
    pub timestamp: DateTime<Utc>,
    pub values: Vec<Option<f64>>,
}

/// A table of MW values indexed by timestamp and generation type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSeries {
    columns: Vec<ColumnKey>,
    rows: Vec<GenerationRow>,
}

impl GenerationSeries {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(column, timestamp, value)` points.
    ///
    /// Columns keep the order in which they first appear; rows are sorted by
    /// timestamp. A repeated `(column, timestamp)` pair keeps the last value.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (ColumnKey, DateTime<Utc>, f64)>,
    {
        let mut columns: Vec<ColumnKey> = Vec::new();
        let mut cells: BTreeMap<DateTime<Utc>, HashMap<usize, f64>> = BTreeMap::new();

        for (key, timestamp, value) in points {
            let index = match columns.iter().position(|c| *c == key) {
                Some(index) => index,
                None => {
                    columns.push(key);
                    columns.len() - 1
                }
            };
            cells.entry(timestamp).or_default().insert(index, value);
        }

        let width = columns.len();
        let rows = cells
            .into_iter()
            .map(|(timestamp, values)| GenerationRow {
                timestamp,
                values: (0..width).map(|i| values.get(&i).copied()).collect(),
            })
            .collect();

        Self { columns, rows }
    }

    /// Column keys in table order.
    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    /// Rows in ascending timestamp order.
    pub fn rows(&self) -> &[GenerationRow] {
        &self.rows
    }

    /// The first column, which the newsletter reports on.
    pub fn leading_column(&self) -> Option<&ColumnKey> {
        self.columns.first()
    }

    /// Position of a column.
    pub fn column_index(&self, key: &ColumnKey) -> Option<usize> {
        self.columns.iter().position(|c| c == key)
    }

    /// `(timestamp, value)` pairs of one column.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = (DateTime<Utc>, Option<f64>)> + '_ {
        self.rows
            .iter()
            .map(move |row| (row.timestamp, row.values.get(index).copied().flatten()))
    }

    /// Keep only the rows matching the predicate.
    pub fn retain_rows<F>(&mut self, predicate: F)
    where
        F: FnMut(&GenerationRow) -> bool,
    {
        self.rows.retain(predicate);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Installed capacity per production type.
///
/// Looking up a type that the API did not return yields `None`, which is
/// different from a type whose capacity is reported as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstalledCapacity {
    by_type: HashMap<String, Vec<f64>>,
}

impl InstalledCapacity {
    /// No capacity data at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Collapse a decoded table into per-type value lists, oldest first.
    ///
    /// Columns sharing a production type are merged in table order.
    pub fn from_series(series: &GenerationSeries) -> Self {
        let mut by_type: HashMap<String, Vec<f64>> = HashMap::new();
        for (index, key) in series.columns().iter().enumerate() {
            let values = by_type.entry(key.kind().to_string()).or_default();
            values.extend(series.column_values(index).filter_map(|(_, value)| value));
        }
        Self { by_type }
    }

    /// Set the values for a production type.
    pub fn insert(&mut self, kind: impl Into<String>, values: Vec<f64>) {
        self.by_type.insert(kind.into(), values);
    }

    /// All values for a production type.
    pub fn get(&self, kind: &str) -> Option<&[f64]> {
        self.by_type.get(kind).map(Vec::as_slice)
    }

    /// The representative (first) value for a production type.
    pub fn representative(&self, kind: &str) -> Option<f64> {
        self.get(kind).and_then(|values| values.first().copied())
    }

    /// Production types present.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<f64>)> for InstalledCapacity {
    fn from_iter<T: IntoIterator<Item = (K, Vec<f64>)>>(iter: T) -> Self {
        Self {
            by_type: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
