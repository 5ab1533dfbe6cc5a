//! Declarative record filtering driven by dashboard controls.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use tracing::debug;

use crate::constants::WILDCARD_CONTROL_VALUES;
use crate::constants::labels::{ALL_CATEGORIES, ALL_YEARS, FILTER_SEPARATOR};
use crate::data::CanonicalRecord;
use crate::dates::parse_iso_date;
use crate::types::CategoryId;

/// Category restriction of a filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    /// No restriction.
    #[default]
    Wildcard,
    /// Only records whose category equals this value.
    Exact(CategoryId),
}

impl CategoryFilter {
    /// Interpret a selector control value; `""`, `all`, and `*` mean wildcard.
    pub fn from_control(value: &str) -> Self {
        let trimmed = value.trim();
        if WILDCARD_CONTROL_VALUES
            .iter()
            .any(|wildcard| trimmed.eq_ignore_ascii_case(wildcard))
        {
            CategoryFilter::Wildcard
        } else {
            CategoryFilter::Exact(trimmed.to_string())
        }
    }

    /// True when `category` passes this filter. Wildcards accept `None` too.
    pub fn matches(&self, category: Option<&str>) -> bool {
        match self {
            CategoryFilter::Wildcard => true,
            CategoryFilter::Exact(expected) => category == Some(expected.as_str()),
        }
    }
}

/// Inclusive ISO date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DateRange {
    /// First included date.
    pub start: NaiveDate,
    /// Last included date.
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping bounds given in reverse order.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// True when `date` (an ISO key) falls inside the range.
    ///
    /// Records without a parseable date never match a range.
    pub fn contains(&self, date: Option<&str>) -> bool {
        date.and_then(parse_iso_date)
            .is_some_and(|date| self.start <= date && date <= self.end)
    }
}

/// Active dashboard filter.
///
/// The default spec places no restriction and passes every record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FilterSpec {
    /// Category restriction.
    pub category: CategoryFilter,
    /// Exact year restriction, `None` for all years.
    pub year: Option<i32>,
    /// Optional inclusive date range over `CanonicalRecord::date`.
    pub dates: Option<DateRange>,
}

impl FilterSpec {
    /// Spec that passes every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a spec from raw category and year control values.
    ///
    /// A year that does not parse as an integer places no year restriction.
    pub fn from_controls(category: &str, year: &str) -> Self {
        let trimmed = year.trim();
        let year = if trimmed.is_empty() {
            None
        } else {
            match trimmed.parse::<i32>() {
                Ok(year) => Some(year),
                Err(_) => {
                    debug!("[regionpulse:filter] ignoring non-numeric year control '{trimmed}'");
                    None
                }
            }
        };
        Self {
            category: CategoryFilter::from_control(category),
            year,
            dates: None,
        }
    }

    /// Restrict to one category.
    pub fn with_category(mut self, category: impl Into<CategoryId>) -> Self {
        self.category = CategoryFilter::Exact(category.into());
        self
    }

    /// Restrict to one calendar year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Restrict to an inclusive date range.
    pub fn with_dates(mut self, range: DateRange) -> Self {
        self.dates = Some(range);
        self
    }

    /// Whether `record` passes every restriction.
    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        let year_ok = self.year.is_none_or(|year| record.year == Some(year));
        let category_ok = self.category.matches(record.category());
        let dates_ok = self
            .dates
            .as_ref()
            .is_none_or(|range| range.contains(record.date()));
        year_ok && category_ok && dates_ok
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{year}")?,
            None => f.write_str(ALL_YEARS)?,
        }
        f.write_str(FILTER_SEPARATOR)?;
        match &self.category {
            CategoryFilter::Wildcard => f.write_str(ALL_CATEGORIES)?,
            CategoryFilter::Exact(category) => f.write_str(category)?,
        }
        if let Some(range) = &self.dates {
            write!(f, "{FILTER_SEPARATOR}{} to {}", range.start, range.end)?;
        }
        Ok(())
    }
}

/// Stable filter over the full record collection.
///
/// Output keeps input order. Not memoized: every call scans all records.
pub fn apply_filter<'a, I>(records: I, spec: &FilterSpec) -> Vec<&'a CanonicalRecord>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    records
        .into_iter()
        .filter(|record| spec.matches(record))
        .collect()
}

/// Distinct categories, ascending, for populating a selector.
pub fn distinct_categories(records: &[CanonicalRecord]) -> Vec<CategoryId> {
    records
        .iter()
        .filter_map(|record| record.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct years, ascending, for populating a selector.
pub fn distinct_years(records: &[CanonicalRecord]) -> Vec<i32> {
    records
        .iter()
        .filter_map(|record| record.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident(year: Option<i32>, race: &str) -> CanonicalRecord {
        CanonicalRecord {
            year,
            category: Some(race.to_string()),
            location: Some("1A1".to_string()),
            ..CanonicalRecord::default()
        }
    }

    #[test]
    fn year_filter_keeps_matching_records_in_order() {
        let records = vec![
            incident(Some(2018), "A"),
            incident(Some(2019), "B"),
            incident(Some(2019), "C"),
            incident(Some(2020), "D"),
        ];
        let spec = FilterSpec::all().with_year(2019);
        let filtered = apply_filter(&records, &spec);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].category(), Some("B"));
        assert_eq!(filtered[1].category(), Some("C"));
    }

    #[test]
    fn category_and_year_combine() {
        let records = vec![
            incident(Some(2019), "Black"),
            incident(Some(2019), "White"),
            incident(Some(2020), "Black"),
            incident(None, "Black"),
        ];
        let spec = FilterSpec::all().with_year(2019).with_category("Black");
        let filtered = apply_filter(&records, &spec);
        assert_eq!(filtered, vec![&records[0]]);

        let all_years = FilterSpec::all().with_category("Black");
        assert_eq!(apply_filter(&records, &all_years).len(), 3);
    }

    #[test]
    fn unknown_values_yield_empty_results() {
        let records = vec![incident(Some(2019), "Black")];
        assert!(apply_filter(&records, &FilterSpec::all().with_category("Martian")).is_empty());
        assert!(apply_filter(&records, &FilterSpec::all().with_year(1850)).is_empty());
    }

    #[test]
    fn controls_parse_wildcards_and_years() {
        assert_eq!(FilterSpec::from_controls("All", ""), FilterSpec::all());
        assert_eq!(FilterSpec::from_controls("*", "any"), FilterSpec::all());
        let spec = FilterSpec::from_controls(" Hispanic ", "2019");
        assert_eq!(spec.category, CategoryFilter::Exact("Hispanic".to_string()));
        assert_eq!(spec.year, Some(2019));
    }

    #[test]
    fn date_range_is_inclusive_and_order_insensitive() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 1, 8).unwrap();
        let range = DateRange::new(end, start);
        assert_eq!(range.start, start);
        assert!(range.contains(Some("2021-01-01")));
        assert!(range.contains(Some("2021-01-08")));
        assert!(!range.contains(Some("2021-01-09")));
        assert!(!range.contains(None));
    }

    #[test]
    fn display_describes_active_restrictions() {
        assert_eq!(FilterSpec::all().to_string(), "all years · all categories");
        assert_eq!(
            FilterSpec::all().with_year(2019).with_category("White").to_string(),
            "2019 · White"
        );
    }

    #[test]
    fn distinct_values_are_sorted_and_unique() {
        let records = vec![
            incident(Some(2020), "White"),
            incident(Some(2018), "Black"),
            incident(None, "White"),
        ];
        assert_eq!(distinct_categories(&records), vec!["Black", "White"]);
        assert_eq!(distinct_years(&records), vec![2018, 2020]);
    }
}
