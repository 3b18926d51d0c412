//! Tax identifier helpers
//!
//! Mexican taxpayer IDs (RFC) embed the incorporation (or birth) date of the
//! taxpayer as six digits `YYMMDD`:
//! - legal entities: 12 characters (`ABC180101XY1`)
//! - individuals: 13 characters (`ABCD800101XY1`)
//!
//! Anything shorter than 12 characters is treated as malformed.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum length of a tax ID that can carry an incorporation date
pub const MIN_TAX_ID_LEN: usize = 12;

/// Two-digit years at or below this pivot belong to the 2000s
pub const DEFAULT_CENTURY_PIVOT: u32 = 20;

static SIX_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{6}").expect("six digit pattern is valid"));

/// Canonical form used when matching tax IDs across sources.
///
/// Trims, uppercases and maps blank values to `None`.
///
/// # Example
/// ```
/// use procurement_risk_core::core::tax_id::normalize_tax_id;
///
/// assert_eq!(normalize_tax_id(" abc180101xy1 "), Some("ABC180101XY1".to_string()));
/// assert_eq!(normalize_tax_id("  "), None);
/// ```
pub fn normalize_tax_id(raw: &str) -> Option<String> {
    let cleaned = raw.trim().to_uppercase();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Derive the incorporation date encoded in a tax ID.
///
/// Returns `None` for short IDs, IDs without a six-digit run, and digit runs
/// that do not form a valid calendar date (foreign identifiers, typos).
///
/// # Arguments
/// * `tax_id` - Normalized tax ID
/// * `century_pivot` - Two-digit years `<= pivot` map to 20YY, others to 19YY
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use procurement_risk_core::core::tax_id::incorporation_date;
///
/// assert_eq!(
///     incorporation_date("ABC180315XY1", 20),
///     NaiveDate::from_ymd_opt(2018, 3, 15)
/// );
/// assert_eq!(
///     incorporation_date("ABCD750101XY1", 20),
///     NaiveDate::from_ymd_opt(1975, 1, 1)
/// );
/// assert_eq!(incorporation_date("ABC1801", 20), None);
/// ```
pub fn incorporation_date(tax_id: &str, century_pivot: u32) -> Option<NaiveDate> {
    if tax_id.chars().count() < MIN_TAX_ID_LEN {
        return None;
    }

    let digits = SIX_DIGITS.find(tax_id)?.as_str();
    let yy: u32 = digits[0..2].parse().ok()?;
    let mm: u32 = digits[2..4].parse().ok()?;
    let dd: u32 = digits[4..6].parse().ok()?;

    let century = if yy <= century_pivot { 2000 } else { 1900 };
    NaiveDate::from_ymd_opt((century + yy) as i32, mm, dd)
}
