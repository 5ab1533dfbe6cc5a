//! Key-based partitioning of record collections.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::data::CanonicalRecord;

/// Record field usable as a grouping or aggregation key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupField {
    /// `CanonicalRecord::location`.
    Location,
    /// `CanonicalRecord::category`.
    Category,
    /// `CanonicalRecord::year`, rendered as a decimal string.
    Year,
    /// `CanonicalRecord::date`.
    Date,
}

impl GroupField {
    /// Key of `record` for this field, `None` when the record has no value.
    pub fn key_of(self, record: &CanonicalRecord) -> Option<String> {
        match self {
            GroupField::Location => record.location.clone(),
            GroupField::Category => record.category.clone(),
            GroupField::Year => record.year.map(|year| year.to_string()),
            GroupField::Date => record.date.clone(),
        }
    }

    /// Short lowercase name used in labels and logs.
    pub fn label(self) -> &'static str {
        match self {
            GroupField::Location => "location",
            GroupField::Category => "category",
            GroupField::Year => "year",
            GroupField::Date => "date",
        }
    }
}

/// Partition `records` by `key_fn`.
///
/// Buckets appear in first-occurrence order and keep input order internally.
/// Every record with a `Some` key lands in exactly one bucket; records whose key
/// is `None` are dropped.
pub fn group_by<'a, R, K, F>(
    records: impl IntoIterator<Item = &'a R>,
    key_fn: F,
) -> IndexMap<K, Vec<&'a R>>
where
    R: 'a,
    K: Hash + Eq,
    F: Fn(&R) -> Option<K>,
{
    let mut groups: IndexMap<K, Vec<&'a R>> = IndexMap::new();
    for record in records {
        if let Some(key) = key_fn(record) {
            groups.entry(key).or_default().push(record);
        }
    }
    groups
}

/// Group canonical records by one of their fields.
pub fn group_by_field<'a>(
    records: impl IntoIterator<Item = &'a CanonicalRecord>,
    field: GroupField,
) -> IndexMap<String, Vec<&'a CanonicalRecord>> {
    group_by(records, |record| field.key_of(record))
}

/// Bucket keys in ascending order.
///
/// ISO `YYYY-MM-DD` keys sort chronologically under this ordering.
pub fn sorted_keys<K, V>(groups: &IndexMap<K, V>) -> Vec<K>
where
    K: Ord + Clone,
{
    let mut keys: Vec<K> = groups.keys().cloned().collect();
    keys.sort();
    keys
}
