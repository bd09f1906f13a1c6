//! Parsing and translation of caller-supplied dates.

use chrono::NaiveDate;

/// Parse a `YYYY-MM-DD` date. Single-digit month and day are accepted.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    if !has_date_shape(input) {
        return None;
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

/// Four-digit year, then a one- or two-digit month and day, `-` separated.
/// chrono alone would also take a sign on the year and leading spaces.
fn has_date_shape(input: &str) -> bool {
    let digits = |part: &str, min: usize, max: usize| {
        (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };
    let mut parts = input.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(month), Some(day), None) => {
            digits(year, 4, 4) && digits(month, 1, 2) && digits(day, 1, 2)
        }
        _ => false,
    }
}

/// The exclusive upper bound that makes `date` itself part of a half-open range.
pub fn exclusive_end(date: NaiveDate) -> Option<NaiveDate> {
    date.succ_opt()
}
