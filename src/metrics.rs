use crate::aggregate::AggregateMap;
use crate::types::AggregateKey;

/// Summary statistics over one aggregate map.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateSummary {
    /// Sum of all values.
    pub total: f64,
    /// Number of keys.
    pub keys: usize,
    /// Smallest value, `0` for an empty map.
    pub min: f64,
    /// Largest value, `0` for an empty map.
    pub max: f64,
    /// Mean value, `0` for an empty map.
    pub mean: f64,
    /// Share of the total held by the largest key.
    pub max_share: f64,
    /// Per-key shares in map order.
    pub per_key: Vec<KeyShare>,
}

/// Per-key share of the aggregate total.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyShare {
    /// Aggregate key.
    pub key: AggregateKey,
    /// Aggregate value.
    pub value: f64,
    /// Fraction of the total, `0` when the total is `0`.
    pub share: f64,
}

/// Compute summary statistics, `None` for an empty map.
///
/// Shares are `0` when the total is `0`. `per_key` is sorted by value
/// descending, then key ascending.
pub fn aggregate_summary(values: &AggregateMap) -> Option<AggregateSummary> {
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.values().sum();
    let keys = values.len();
    let min = values.values().copied().fold(f64::INFINITY, f64::min);
    let max = values.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = total / keys as f64;
    let share_of = |value: f64| if total == 0.0 { 0.0 } else { value / total };
    let mut per_key: Vec<KeyShare> = values
        .iter()
        .map(|(key, value)| KeyShare {
            key: key.clone(),
            value: *value,
            share: share_of(*value),
        })
        .collect();
    per_key.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
    Some(AggregateSummary {
        total,
        keys,
        min,
        max,
        mean,
        max_share: share_of(max),
        per_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_balance() {
        let mut values = AggregateMap::new();
        values.insert("A".to_string(), 2.0);
        values.insert("B".to_string(), 2.0);
        let summary = aggregate_summary(&values).expect("summary");
        assert_eq!(summary.total, 4.0);
        assert_eq!(summary.keys, 2);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 2.0);
        assert!((summary.max_share - 0.5).abs() < 1e-9);
        assert!(
            summary
                .per_key
                .iter()
                .all(|entry| (entry.share - 0.5).abs() < 1e-9)
        );
    }

    #[test]
    fn summary_reports_imbalance() {
        let mut values = AggregateMap::new();
        values.insert("B".to_string(), 2.0);
        values.insert("A".to_string(), 4.0);
        values.insert("C".to_string(), 2.0);
        let summary = aggregate_summary(&values).expect("summary");
        assert_eq!(summary.total, 8.0);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 4.0);
        assert!((summary.mean - 8.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.per_key[0].key, "A");
        assert_eq!(summary.per_key[1].key, "B");
        assert_eq!(summary.per_key[2].key, "C");
    }

    #[test]
    fn zero_totals_have_zero_shares() {
        let mut values = AggregateMap::new();
        values.insert("A".to_string(), 0.0);
        let summary = aggregate_summary(&values).expect("summary");
        assert_eq!(summary.max_share, 0.0);
        assert_eq!(summary.per_key[0].share, 0.0);
        assert!(aggregate_summary(&AggregateMap::new()).is_none());
    }
}
