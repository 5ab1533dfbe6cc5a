use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use crate::types::{CategoryId, ColumnName, DateKey, LocationKey, MetricName};

/// One row of a tabular parse: column name to raw string value.
///
/// No column is guaranteed to be present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    fields: IndexMap<ColumnName, String>,
}

impl RawRecord {
    /// Build a raw record from `(column, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<ColumnName>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }

    /// Raw value stored under `column`, matched exactly.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Store `value` under `column`, replacing any previous value.
    pub fn insert(&mut self, column: impl Into<ColumnName>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Column names present on this row, in parse order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields on this row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parsed tabular payload: header list plus rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    /// Header names in file order.
    pub headers: Vec<ColumnName>,
    /// Parsed rows keyed by header.
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    /// Table from headers and rows.
    pub fn new(headers: Vec<ColumnName>, rows: Vec<RawRecord>) -> Self {
        Self { headers, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Normalized, typed representation of one source row.
///
/// Immutable once produced by the normalizer. String keys are trimmed and empty
/// values are stored as `None`, so aggregation never sees a `""` bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// ISO `YYYY-MM-DD` bucket date (time series variant).
    pub date: Option<DateKey>,
    /// Calendar year derived from the date or timestamp column.
    pub year: Option<i32>,
    /// Category label (race, incident type, ...).
    pub category: Option<CategoryId>,
    /// Join key compared by exact equality against feature properties.
    pub location: Option<LocationKey>,
    /// Numeric fields, always finite.
    pub metrics: BTreeMap<MetricName, f64>,
}

impl CanonicalRecord {
    /// Metric value by name, `0.0` when the record does not carry it.
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(0.0)
    }

    /// Bucket date, if any.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// Category label, if any.
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Location join key, if any.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_record_lookup_is_exact() {
        let row = RawRecord::from_pairs([("Date", "2021-01-01"), ("state", "CA")]);
        assert_eq!(row.get("Date"), Some("2021-01-01"));
        assert_eq!(row.get("date"), None);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["Date", "state"]);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn missing_metric_reads_as_zero() {
        let mut record = CanonicalRecord::default();
        record.metrics.insert("cases".to_string(), 12.0);
        assert_eq!(record.metric("cases"), 12.0);
        assert_eq!(record.metric("deaths"), 0.0);
    }
}
