//! Company name normalization
//!
//! Every join between the disclosure records, the bid roster and the external
//! reference lists compares companies by a normalized name key
//! (`razon_social_simple`). This module produces that key.
//!
//! # Algorithm
//!
//! 1. Trim and uppercase
//! 2. Strip periods and commas
//! 3. Remove the combining acute accent (NFD → drop U+0301 → NFC)
//! 4. Remove legal-entity suffixes ("SA DE CV", "S DE RL", ...) in a fixed order
//! 5. Remove a bare trailing token ("SA", "INC", ...) when it occurs exactly once
//!
//! The pass is repeated until the value no longer changes, so normalizing an
//! already-normalized key is a no-op.
//!
//! # Example
//!
//! ```rust
//! use procurement_risk_core::core::names::normalize_name;
//!
//! assert_eq!(normalize_name("ACME, S.A. DE C.V."), Some("ACME".to_string()));
//! assert_eq!(normalize_name("S.A. DE C.V."), None);
//! assert_eq!(normalize_name(""), None);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const COMBINING_ACUTE_ACCENT: char = '\u{0301}';

/// Legal-entity suffix patterns, applied in order.
///
/// Each pattern tolerates a missing space between the letters of an
/// abbreviation ("S A" vs "SA") and any run of spaces between words.
const LEGAL_SUFFIX_PATTERNS: [&str; 12] = [
    // SA DE CV
    r"S\s?A\s+D\s?E\s+C\s?V",
    // SAPI DE CV
    r"S\s?A\s?P\s?I\s+D\s?E\s+C\s?V",
    // SAB DE CV
    r"S\s?A\s?B\s+D\s?E\s+C\s?V",
    // S DE RL DE CV
    r"S\s?D\s?E\s+R\s?L\s+D\s?E\s+C\s?V",
    // S DE RL
    r"S\s?D\s?E\s+R\s?L",
    // SC DE RL DE CV
    r"S\s?C\s+D\s?E\s+R\s?L\s+D\s?E\s+C\s?V",
    // SCP DE RL DE CV
    r"S\s?C\s?P\s+D\s?E\s+R\s?L\s+D\s?E\s+C\s?V",
    // SPR DE RL DE CV
    r"S\s?P\s?R\s+D\s?E\s+R\s?L\s+D\s?E\s+C\s?V",
    // PR DE RL DE CV
    r"P\s?R\s+D\s?E\s+R\s?L\s+D\s?E\s+C\s?V",
    // SC DE C DE RL DE CV
    r"S\s?C\s+D\s?E\s+C\s+D\s?E\s+R\s?L\s+D\s?E\s+C\s?V",
    // SPR DE RL
    r"S\s?P\s?R\s+D\s?E\s+R\s?L",
    // S DE PR DE RL
    r"S\s+D\s?E\s+P\s?R\s+D\s?E\s+R\s?L",
];

/// Bare suffix tokens left over after the patterns above.
const TRAILING_TOKENS: [&str; 5] = ["SC", "SA", "INC", "LLC", "SAPI"];

static LEGAL_SUFFIXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    LEGAL_SUFFIX_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("legal suffix pattern is valid"))
        .collect()
});

/// Normalize one raw company name.
///
/// Returns `None` when nothing is left after normalization, so two unknown
/// names never compare equal to each other.
pub fn normalize_name(raw: &str) -> Option<String> {
    let mut current = raw.trim().to_uppercase();
    loop {
        let next = normalization_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    if current.is_empty() {
        None
    } else {
        Some(current)
    }
}

/// Normalize an optional raw name (a missing value stays missing).
pub fn normalize_optional(raw: Option<&str>) -> Option<String> {
    raw.and_then(normalize_name)
}

/// Normalize a batch of raw names, preserving order.
pub fn normalize_names<'a, I>(raw: I) -> Vec<Option<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter().map(normalize_name).collect()
}

fn normalization_pass(name: &str) -> String {
    let upper = name.to_uppercase();
    let stripped: String = upper.chars().filter(|c| *c != '.' && *c != ',').collect();
    let mut result = remove_acute_accents(&stripped);

    for pattern in LEGAL_SUFFIXES.iter() {
        result = pattern.replace_all(&result, "").trim().to_string();
    }

    for token in TRAILING_TOKENS {
        result = remove_trailing_token(&result, token);
    }

    result.trim().to_string()
}

/// Remove only the combining acute accent ("compañía" → "compañia").
fn remove_acute_accents(s: &str) -> String {
    s.nfd()
        .filter(|c| *c != COMBINING_ACUTE_ACCENT)
        .nfc()
        .collect()
}

/// Drop `" {token}"` from the end when it appears exactly once in `s`.
fn remove_trailing_token(s: &str, token: &str) -> String {
    let suffix = format!(" {}", token);
    if s.matches(suffix.as_str()).count() == 1 && s.ends_with(suffix.as_str()) {
        s[..s.len() - suffix.len()].to_string()
    } else {
        s.to_string()
    }
}
