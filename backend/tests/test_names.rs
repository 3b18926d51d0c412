//! Tests for company-name and tax-ID normalization

use chrono::NaiveDate;
use procurement_risk_core::core::names::{normalize_name, normalize_names, normalize_optional};
use procurement_risk_core::core::tax_id::{incorporation_date, normalize_tax_id};
use proptest::prelude::*;

// ============================================================================
// Name normalization
// ============================================================================

#[test]
fn test_legal_suffix_with_punctuation_removed() {
    assert_eq!(normalize_name("ACME, S.A. DE C.V."), Some("ACME".to_string()));
    assert_eq!(normalize_name("  acme sa de cv  "), Some("ACME".to_string()));
}

#[test]
fn test_empty_and_suffix_only_names_are_null() {
    assert_eq!(normalize_name(""), None);
    assert_eq!(normalize_name("   "), None);
    assert_eq!(normalize_name("S.A. DE C.V."), None);
}

#[test]
fn test_suffix_variants_with_irregular_spacing() {
    for raw in [
        "CONSTRUCTORA DEL GOLFO S. DE R.L. DE C.V.",
        "CONSTRUCTORA DEL GOLFO S DE RL",
        "Constructora del Golfo, SAPI de CV",
        "CONSTRUCTORA DEL GOLFO S.A.B. DE C.V.",
        "CONSTRUCTORA DEL GOLFO SA  DE  CV",
    ] {
        assert_eq!(
            normalize_name(raw),
            Some("CONSTRUCTORA DEL GOLFO".to_string()),
            "raw: {}",
            raw
        );
    }
}

#[test]
fn test_trailing_tokens_removed() {
    assert_eq!(normalize_name("Beta SC"), Some("BETA".to_string()));
    assert_eq!(normalize_name("Gamma Inc."), Some("GAMMA".to_string()));
    assert_eq!(normalize_name("Delta LLC"), Some("DELTA".to_string()));
}

#[test]
fn test_acute_accents_removed_tilde_kept() {
    assert_eq!(
        normalize_name("Compañía Petrolera Mexicana"),
        Some("COMPAÑIA PETROLERA MEXICANA".to_string())
    );
    assert_eq!(normalize_name("SERVICIOS TÉCNICOS"), normalize_name("Servicios Tecnicos"));
}

#[test]
fn test_optional_and_batch_helpers() {
    assert_eq!(normalize_optional(None), None);
    assert_eq!(normalize_optional(Some("ACME SA")), Some("ACME".to_string()));
    assert_eq!(
        normalize_names(vec!["ACME SA DE CV", "", "Beta Inc"]),
        vec![Some("ACME".to_string()), None, Some("BETA".to_string())]
    );
}

proptest! {
    #[test]
    fn prop_normalization_is_idempotent(raw in "[A-Za-zÁÉÍÓÚÑáéíóúñ., ]{0,30}( S\\.A\\. DE C\\.V\\.| SC| INC| S DE RL)?") {
        let once = normalize_name(&raw);
        let twice = once.as_deref().and_then(normalize_name);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_normalized_names_have_no_punctuation_or_padding(raw in "[A-Za-z., ]{0,30}") {
        if let Some(name) = normalize_name(&raw) {
            prop_assert!(!name.contains('.'));
            prop_assert!(!name.contains(','));
            prop_assert_eq!(name.trim(), name.as_str());
            prop_assert_eq!(name.to_uppercase(), name.clone());
        }
    }
}

// ============================================================================
// Tax IDs
// ============================================================================

#[test]
fn test_tax_id_cleanup() {
    assert_eq!(normalize_tax_id(" acm190101ab1"), Some("ACM190101AB1".to_string()));
    assert_eq!(normalize_tax_id(""), None);
}

#[test]
fn test_incorporation_date_century_pivot() {
    assert_eq!(
        incorporation_date("ACM190101AB1", 20),
        NaiveDate::from_ymd_opt(2019, 1, 1)
    );
    assert_eq!(
        incorporation_date("OLD990101AB1", 20),
        NaiveDate::from_ymd_opt(1999, 1, 1)
    );
    assert_eq!(
        incorporation_date("OLD210101AB1", 20),
        NaiveDate::from_ymd_opt(1921, 1, 1)
    );
}

#[test]
fn test_incorporation_date_invalid_inputs() {
    assert_eq!(incorporation_date("ACM191301AB1", 20), None, "month 13");
    assert_eq!(incorporation_date("ACMXXXXXXAB1", 20), None, "no digits");
    assert_eq!(incorporation_date("AC190101", 20), None, "too short");
}
