use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateMap;
use crate::types::AggregateKey;

/// One `(key, value)` entry of a ranked aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// Aggregate key.
    pub key: AggregateKey,
    /// Aggregate value.
    pub value: f64,
}

impl RankedEntry {
    /// Entry from a key and value.
    pub fn new(key: impl Into<AggregateKey>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Entries sorted by value descending, truncated to `k`.
///
/// The sort is stable, so equal values keep the map's iteration order. Pass
/// `usize::MAX` to rank every entry.
pub fn top_k(values: &AggregateMap, k: usize) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = values
        .iter()
        .map(|(key, value)| RankedEntry::new(key.clone(), *value))
        .collect();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked.truncate(k);
    ranked
}

/// Highest entry; the earliest key wins ties. `None` for an empty map.
pub fn top_entry(values: &AggregateMap) -> Option<RankedEntry> {
    let mut best: Option<(&AggregateKey, f64)> = None;
    for (key, value) in values {
        match best {
            Some((_, best_value)) if *value <= best_value => {}
            _ => best = Some((key, *value)),
        }
    }
    best.map(|(key, value)| RankedEntry::new(key.clone(), value))
}

/// Sum of every value.
pub fn total(values: &AggregateMap) -> f64 {
    values.values().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> AggregateMap {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), *value))
            .collect()
    }

    #[test]
    fn top_k_sorts_descending_and_truncates() {
        let values = map(&[("A", 1.0), ("B", 7.0), ("C", 3.0), ("D", 5.0)]);
        let ranked = top_k(&values, 2);
        assert_eq!(ranked, vec![RankedEntry::new("B", 7.0), RankedEntry::new("D", 5.0)]);
    }

    #[test]
    fn top_k_breaks_ties_by_insertion_order() {
        let values = map(&[("A", 5.0), ("B", 5.0), ("C", 10.0)]);
        assert_eq!(
            top_k(&values, 2),
            vec![RankedEntry::new("C", 10.0), RankedEntry::new("A", 5.0)]
        );

        let reversed = map(&[("B", 5.0), ("A", 5.0), ("C", 10.0)]);
        assert_eq!(
            top_k(&reversed, 2),
            vec![RankedEntry::new("C", 10.0), RankedEntry::new("B", 5.0)]
        );
    }

    #[test]
    fn top_k_larger_than_map_returns_everything() {
        let values = map(&[("A", 1.0), ("B", 2.0)]);
        assert_eq!(top_k(&values, usize::MAX).len(), 2);
        assert!(top_k(&AggregateMap::new(), 10).is_empty());
        assert!(top_k(&values, 0).is_empty());
    }

    #[test]
    fn top_entry_prefers_first_maximum() {
        let values = map(&[("A", 5.0), ("B", 9.0), ("C", 9.0)]);
        assert_eq!(top_entry(&values), Some(RankedEntry::new("B", 9.0)));
        assert_eq!(top_entry(&AggregateMap::new()), None);

        let zeros = map(&[("A", 0.0), ("B", 0.0)]);
        assert_eq!(top_entry(&zeros), Some(RankedEntry::new("A", 0.0)));
    }

    #[test]
    fn total_sums_all_values() {
        assert_eq!(total(&map(&[("A", 1.5), ("B", 2.5)])), 4.0);
        assert_eq!(total(&AggregateMap::new()), 0.0);
    }
}
