//! Raw-row to canonical-record normalization.
//!
//! Column names are resolved once per table with a fixed fallback chain
//! (exact, case-insensitive, token heuristic). Per-row anomalies are recovered
//! with defaults: numbers fall back to `0`, dates and years to `None`, and empty
//! keys to `None`.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::ColumnMapping;
use crate::data::{CanonicalRecord, RawRecord, RawTable};
use crate::dates::{iso_date_key, parse_year};
use crate::types::{ColumnName, MetricName};

/// Outcome of resolving an expected column name against real headers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnResolution {
    /// The expected name is present verbatim.
    Exact(ColumnName),
    /// A header equals the expected name ignoring ASCII case.
    CaseInsensitive(ColumnName),
    /// A header contains every heuristic token (lowercased).
    Heuristic(ColumnName),
    /// No candidate header exists.
    Unresolved,
}

impl ColumnResolution {
    /// Header to read, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            ColumnResolution::Exact(name)
            | ColumnResolution::CaseInsensitive(name)
            | ColumnResolution::Heuristic(name) => Some(name),
            ColumnResolution::Unresolved => None,
        }
    }

    /// True unless [`ColumnResolution::Unresolved`].
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ColumnResolution::Unresolved)
    }
}

/// Coerce a raw string to a finite number.
///
/// Accepts decimal and exponent notation plus unsigned `0x`, `0o` and `0b`
/// integer literals. Empty and whitespace-only strings are `0`, as are
/// non-numeric values, `NaN`, and infinities. Never fails.
pub fn to_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let parsed = match radix_literal(trimmed) {
        Some((radix, digits)) => parse_radix_digits(digits, radix),
        None => trimmed.parse::<f64>().ok(),
    };
    match parsed {
        Some(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

fn radix_literal(value: &str) -> Option<(u32, &str)> {
    let prefix = value.get(..2)?;
    let radix = match prefix.to_ascii_lowercase().as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };
    Some((radix, &value[2..]))
}

/// Digits accumulate in `f64` so long literals lose precision instead of overflowing.
fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix)
            .map(|digit| acc * f64::from(radix) + f64::from(digit))
    })
}

/// Trim a key value, mapping empty results to `None`.
pub fn normalize_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Resolve `expected` against `headers`.
///
/// Order: exact match, then case-insensitive exact match, then (when
/// `heuristic_tokens` is non-empty) the first header whose lowercase form
/// contains every token.
pub fn resolve_column(
    headers: &[ColumnName],
    expected: &str,
    heuristic_tokens: &[String],
) -> ColumnResolution {
    if let Some(found) = headers.iter().find(|header| header.as_str() == expected) {
        return ColumnResolution::Exact(found.clone());
    }
    if let Some(found) = headers
        .iter()
        .find(|header| header.eq_ignore_ascii_case(expected))
    {
        return ColumnResolution::CaseInsensitive(found.clone());
    }
    if !heuristic_tokens.is_empty() {
        let tokens: Vec<String> = heuristic_tokens
            .iter()
            .map(|token| token.to_ascii_lowercase())
            .collect();
        if let Some(found) = headers.iter().find(|header| {
            let lower = header.to_ascii_lowercase();
            tokens.iter().all(|token| lower.contains(token.as_str()))
        }) {
            return ColumnResolution::Heuristic(found.clone());
        }
    }
    ColumnResolution::Unresolved
}

/// Column resolutions chosen for one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Date column, when configured.
    pub date: Option<ColumnResolution>,
    /// Timestamp column, when configured.
    pub timestamp: Option<ColumnResolution>,
    /// Category column, when configured.
    pub category: Option<ColumnResolution>,
    /// Location column, when configured.
    pub location: Option<ColumnResolution>,
    /// Metric columns in configuration order.
    pub metrics: Vec<(MetricName, ColumnResolution)>,
}

impl ResolvedColumns {
    /// True when some column can supply a record year.
    pub fn has_year_source(&self) -> bool {
        [&self.timestamp, &self.date]
            .into_iter()
            .flatten()
            .any(ColumnResolution::is_resolved)
    }
}

/// Converts raw rows into canonical records using columns resolved up front.
#[derive(Clone, Debug)]
pub struct Normalizer {
    columns: ResolvedColumns,
}

impl Normalizer {
    /// Resolve every configured column against `headers`.
    ///
    /// An unresolvable date/timestamp column is a diagnostic, not an error:
    /// records normalized afterwards carry `year = None`.
    pub fn new(headers: &[ColumnName], mapping: &ColumnMapping) -> Self {
        let no_tokens: &[String] = &[];
        let date = mapping
            .date
            .as_deref()
            .map(|name| resolve_column(headers, name, &mapping.date_tokens));
        let timestamp = mapping
            .timestamp
            .as_deref()
            .map(|name| resolve_column(headers, name, &mapping.timestamp_tokens));
        let category = mapping
            .category
            .as_deref()
            .map(|name| resolve_column(headers, name, no_tokens));
        let location = mapping
            .location
            .as_deref()
            .map(|name| resolve_column(headers, name, no_tokens));
        let metrics = mapping
            .metrics
            .iter()
            .map(|name| (name.clone(), resolve_column(headers, name, no_tokens)))
            .collect();

        let columns = ResolvedColumns {
            date,
            timestamp,
            category,
            location,
            metrics,
        };

        if (mapping.date.is_some() || mapping.timestamp.is_some()) && !columns.has_year_source() {
            warn!(
                "[regionpulse:normalize] no date column found in headers {:?}; year filtering disabled",
                headers
            );
        }
        for (label, resolution) in [
            ("date", &columns.date),
            ("timestamp", &columns.timestamp),
            ("category", &columns.category),
            ("location", &columns.location),
        ] {
            match resolution {
                Some(ColumnResolution::Unresolved) => {
                    warn!("[regionpulse:normalize] {label} column unresolved")
                }
                Some(ColumnResolution::CaseInsensitive(name))
                | Some(ColumnResolution::Heuristic(name)) => {
                    debug!("[regionpulse:normalize] {label} column resolved to '{name}'")
                }
                _ => {}
            }
        }
        for (metric, resolution) in &columns.metrics {
            if !resolution.is_resolved() {
                warn!("[regionpulse:normalize] metric column '{metric}' unresolved; values default to 0");
            }
        }

        Self { columns }
    }

    /// Resolutions chosen for the table headers.
    pub fn columns(&self) -> &ResolvedColumns {
        &self.columns
    }

    /// Build the canonical form of one raw row.
    pub fn normalize(&self, row: &RawRecord) -> CanonicalRecord {
        let read = |resolution: &Option<ColumnResolution>| {
            resolution
                .as_ref()
                .and_then(ColumnResolution::column)
                .and_then(|column| row.get(column))
        };

        let timestamp = read(&self.columns.timestamp);
        let date = read(&self.columns.date)
            .and_then(iso_date_key)
            .or_else(|| timestamp.and_then(iso_date_key));
        let year = timestamp
            .and_then(parse_year)
            .or_else(|| date.as_deref().and_then(parse_year));
        let category = read(&self.columns.category).and_then(normalize_key);
        let location = read(&self.columns.location).and_then(normalize_key);

        let metrics: BTreeMap<MetricName, f64> = self
            .columns
            .metrics
            .iter()
            .map(|(name, resolution)| {
                let value = resolution
                    .column()
                    .and_then(|column| row.get(column))
                    .map(to_number)
                    .unwrap_or(0.0);
                (name.clone(), value)
            })
            .collect();

        CanonicalRecord {
            date,
            year,
            category,
            location,
            metrics,
        }
    }
}

/// Canonical records plus the column resolutions used to build them.
#[derive(Clone, Debug)]
pub struct NormalizedTable {
    /// One record per raw row, in row order.
    pub records: Vec<CanonicalRecord>,
    /// Resolutions used for every row.
    pub columns: ResolvedColumns,
}

/// Normalize every row of `table`.
pub fn normalize_table(table: &RawTable, mapping: &ColumnMapping) -> NormalizedTable {
    let normalizer = Normalizer::new(&table.headers, mapping);
    let records: Vec<CanonicalRecord> = table
        .rows
        .iter()
        .map(|row| normalizer.normalize(row))
        .collect();
    let undated = records.iter().filter(|record| record.year.is_none()).count();
    debug!(
        "[regionpulse:normalize] normalized {} rows ({} without a year)",
        records.len(),
        undated
    );
    NormalizedTable {
        records,
        columns: normalizer.columns,
    }
}
