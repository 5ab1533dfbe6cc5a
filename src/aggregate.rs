//! Count and time-window delta aggregation.
//!
//! Aggregate maps are rebuilt from scratch on every call. Key iteration order is
//! first-occurrence order, but it carries no meaning: rank with
//! [`crate::ranking::top_k`] before display.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::data::CanonicalRecord;
use crate::grouping::{GroupField, group_by_field, sorted_keys};
use crate::types::{AggregateKey, DateKey};

/// Key to numeric value mapping; keys exist only for contributing records.
pub type AggregateMap = IndexMap<AggregateKey, f64>;

/// Running tally per key. Records whose key is `None` create no bucket.
pub fn count_by<'a, K, F>(
    records: impl IntoIterator<Item = &'a CanonicalRecord>,
    key_fn: F,
) -> IndexMap<K, f64>
where
    K: Hash + Eq,
    F: Fn(&CanonicalRecord) -> Option<K>,
{
    let mut counts: IndexMap<K, f64> = IndexMap::new();
    for record in records {
        if let Some(key) = key_fn(record) {
            *counts.entry(key).or_insert(0.0) += 1.0;
        }
    }
    counts
}

/// Record counts keyed by one record field.
pub fn count_by_field<'a>(
    records: impl IntoIterator<Item = &'a CanonicalRecord>,
    field: GroupField,
) -> AggregateMap {
    count_by(records, |record| field.key_of(record))
}

/// Sum of `metric` per key.
pub fn sum_by<'a, K, F>(
    records: impl IntoIterator<Item = &'a CanonicalRecord>,
    key_fn: F,
    metric: &str,
) -> IndexMap<K, f64>
where
    K: Hash + Eq,
    F: Fn(&CanonicalRecord) -> Option<K>,
{
    let mut sums: IndexMap<K, f64> = IndexMap::new();
    for record in records {
        if let Some(key) = key_fn(record) {
            *sums.entry(key).or_insert(0.0) += record.metric(metric);
        }
    }
    sums
}

/// Latest date bucket and the baseline bucket `window` positions before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowBounds {
    /// Latest date bucket.
    pub latest: DateKey,
    /// Baseline date bucket.
    pub previous: DateKey,
}

/// Pick the latest date and its lookback baseline from ascending distinct dates.
///
/// `previous = dates[max(0, len - 1 - window)]`; with fewer than `window + 1`
/// dates the baseline is the earliest date. `None` for an empty slice.
pub fn latest_and_previous(sorted_dates: &[DateKey], window: usize) -> Option<WindowBounds> {
    let latest = sorted_dates.last()?;
    let previous_idx = (sorted_dates.len() - 1).saturating_sub(window);
    Some(WindowBounds {
        latest: latest.clone(),
        previous: sorted_dates[previous_idx].clone(),
    })
}

/// Per-location growth of `metric` between `bounds.previous` and `bounds.latest`.
///
/// * Only locations present in the latest bucket appear in the result.
/// * A location missing from the baseline bucket has a baseline of `0`.
/// * Declines are clipped to `0`.
/// * When a location repeats within one bucket the later row wins.
pub fn delta_by_location(
    groups: &IndexMap<DateKey, Vec<&CanonicalRecord>>,
    bounds: &WindowBounds,
    metric: &str,
) -> AggregateMap {
    let latest = location_values(groups.get(&bounds.latest), metric);
    let previous = location_values(groups.get(&bounds.previous), metric);

    latest
        .into_iter()
        .map(|(location, latest_value)| {
            let previous_value = previous.get(&location).copied().unwrap_or(0.0);
            let delta = (latest_value - previous_value).max(0.0);
            (location, delta)
        })
        .collect()
}

fn location_values(bucket: Option<&Vec<&CanonicalRecord>>, metric: &str) -> AggregateMap {
    let mut values = AggregateMap::new();
    for record in bucket.into_iter().flatten() {
        if let Some(location) = &record.location {
            values.insert(location.clone(), record.metric(metric));
        }
    }
    values
}

/// Result of a full window-delta computation.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowDelta {
    /// Dates compared, `None` when no record carries a date.
    pub bounds: Option<WindowBounds>,
    /// Growth per location.
    pub deltas: AggregateMap,
}

/// Group by date, pick the window bounds, and difference `metric` per location.
pub fn window_delta<'a>(
    records: impl IntoIterator<Item = &'a CanonicalRecord>,
    metric: &str,
    window: usize,
) -> WindowDelta {
    let groups = group_by_field(records, GroupField::Date);
    let dates = sorted_keys(&groups);
    match latest_and_previous(&dates, window) {
        Some(bounds) => {
            let deltas = delta_by_location(&groups, &bounds, metric);
            WindowDelta {
                bounds: Some(bounds),
                deltas,
            }
        }
        None => WindowDelta {
            bounds: None,
            deltas: AggregateMap::new(),
        },
    }
}
