//! Calendar helpers for milestone dates

use chrono::NaiveDate;

/// Whole days from `start` to `end` (negative when `end` precedes `start`).
///
/// Returns `None` if either date is missing.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use procurement_risk_core::core::dates::days_between;
///
/// let start = NaiveDate::from_ymd_opt(2019, 1, 1);
/// let end = NaiveDate::from_ymd_opt(2019, 1, 11);
/// assert_eq!(days_between(start, end), Some(10));
/// assert_eq!(days_between(start, None), None);
/// ```
pub fn days_between(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<i64> {
    match (start, end) {
        (Some(start), Some(end)) => Some((end - start).num_days()),
        _ => None,
    }
}

/// Days since 1970-01-01, used to export dates as continuous columns.
pub fn epoch_days(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days()
}

/// Smaller of two optional day counts, ignoring missing ones
pub fn min_days(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
