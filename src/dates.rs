use chrono::{Datelike, NaiveDate};

use crate::types::DateKey;

/// Parse a record date written as `MM/DD/YYYY` or `YYYY-MM-DD`.
///
/// Anything after the date itself (a time of day, a `T` separator, an AM/PM
/// marker) is ignored. Surrounding whitespace is tolerated. Returns `None` when
/// neither format matches or the month/day are out of range.
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    parse_slash_date(value).or_else(|| parse_iso_prefix(value))
}

/// Calendar year of a free-form timestamp, `None` when it cannot be parsed.
pub fn parse_year(value: &str) -> Option<i32> {
    parse_record_date(value).map(|date| date.year())
}

/// Normalize a record date to its ISO `YYYY-MM-DD` bucket key.
pub fn iso_date_key(value: &str) -> Option<DateKey> {
    parse_record_date(value).map(|date| date.format("%Y-%m-%d").to_string())
}

/// Parse a full ISO date (`YYYY-MM-DD`, no suffix). Used for filter bounds.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// `MM/DD/YYYY` followed by an optional whitespace-separated time part.
fn parse_slash_date(value: &str) -> Option<NaiveDate> {
    let head = value.split_whitespace().next()?;
    if !head.contains('/') {
        return None;
    }
    NaiveDate::parse_from_str(head, "%m/%d/%Y").ok()
}

/// `YYYY-MM-DD` prefix followed by anything (`T12:00:00Z`, ` 08:15`, ...).
fn parse_iso_prefix(value: &str) -> Option<NaiveDate> {
    let head = value.get(..10)?;
    if let Some(rest) = value.get(10..) {
        // Reject longer digit runs such as `2021-01-011`.
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slash_timestamps_with_time_suffix() {
        assert_eq!(
            parse_record_date("03/15/2019 10:42:00 PM"),
            NaiveDate::from_ymd_opt(2019, 3, 15)
        );
        assert_eq!(
            parse_record_date("12/31/2020"),
            NaiveDate::from_ymd_opt(2020, 12, 31)
        );
        assert_eq!(
            parse_record_date("  01/02/2018 00:00 "),
            NaiveDate::from_ymd_opt(2018, 1, 2)
        );
        assert_eq!(parse_record_date("13/01/2019 10:00"), None);
        assert_eq!(parse_record_date("02/30/2019"), None);
    }

    #[test]
    fn parses_iso_prefixed_values() {
        assert_eq!(
            parse_record_date("2021-01-08"),
            NaiveDate::from_ymd_opt(2021, 1, 8)
        );
        assert_eq!(
            parse_record_date("2021-01-08T23:59:59Z"),
            NaiveDate::from_ymd_opt(2021, 1, 8)
        );
        assert_eq!(
            parse_record_date("2021-01-08 08:15"),
            NaiveDate::from_ymd_opt(2021, 1, 8)
        );
        assert_eq!(parse_record_date("2021-13-08"), None);
        assert_eq!(parse_record_date("2021-01-081"), None);
    }

    #[test]
    fn unrecognized_formats_yield_none() {
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("yesterday"), None);
        assert_eq!(parse_year("15.03.2019"), None);
        assert_eq!(parse_year("2019"), None);
        assert_eq!(parse_year("Mar 15, 2019"), None);
    }

    #[test]
    fn year_and_iso_key_follow_parsed_date() {
        assert_eq!(parse_year("03/15/2019 10:42:00 PM"), Some(2019));
        assert_eq!(parse_year("2020-07-04T00:00:00"), Some(2020));
        assert_eq!(iso_date_key("03/05/2019 1:00"), Some("2019-03-05".to_string()));
        assert_eq!(iso_date_key("2021-01-01"), Some("2021-01-01".to_string()));
        assert_eq!(iso_date_key("n/a"), None);
    }

    #[test]
    fn iso_filter_bounds_require_exact_dates() {
        assert_eq!(
            parse_iso_date(" 2021-02-01 "),
            NaiveDate::from_ymd_opt(2021, 2, 1)
        );
        assert_eq!(parse_iso_date("2021-02-01T00:00"), None);
        assert_eq!(parse_iso_date("02/01/2021"), None);
    }
}
