//! Tests for the market-concentration calculators

use procurement_risk_core::models::{ContractRecord, SupplierKey};
use procurement_risk_core::pipeline::{FeatureSet, PipelineConfig, PipelineInputs, RiskPipeline};

// ============================================================================
// Test Helpers
// ============================================================================

fn run(contracts: Vec<ContractRecord>) -> FeatureSet {
    RiskPipeline::new(PipelineConfig::default())
        .unwrap()
        .compute_features(&PipelineInputs::new(contracts))
        .unwrap()
}

fn award(number: usize, supplier: &str, entity: &str, amount: f64) -> ContractRecord {
    ContractRecord::new(format!("EV-{}", number), format!("C-{}", number), supplier)
        .with_segment(entity, "Goods")
        .with_amount(amount)
}

fn key(name: &str) -> SupplierKey {
    SupplierKey::new(name)
}

/// Ten contracts in one segment: DOMINANT wins five, five others one each
fn dominated_segment() -> Vec<ContractRecord> {
    let mut contracts: Vec<ContractRecord> = (0..5)
        .map(|i| award(i, "DOMINANT", "PEP", 100.0))
        .collect();
    for (i, name) in ["ALPHA", "BRAVO", "CHARLIE", "DELTA", "ECHO"].iter().enumerate() {
        contracts.push(award(5 + i, name, "PEP", 100.0));
    }
    contracts
}

// ============================================================================
// Count-based shares
// ============================================================================

#[test]
fn test_dominant_supplier_is_flagged() {
    let set = run(dominated_segment());
    let column = "risky_market_share_by_count";

    assert_eq!(set.suppliers.get(&key("DOMINANT"), column), Some(1.0));
    for name in ["ALPHA", "BRAVO", "CHARLIE", "DELTA", "ECHO"] {
        assert_eq!(set.suppliers.get(&key(name), column), Some(0.0), "{}", name);
    }
    assert_eq!(set.suppliers.get(&key("DOMINANT"), "share_by_count_pep_goods"), Some(0.5));
    assert_eq!(set.suppliers.get(&key("ALPHA"), "share_by_count_pep_goods"), Some(0.1));
}

#[test]
fn test_small_segment_is_ignored() {
    let mut contracts = dominated_segment();
    for i in 0..5 {
        contracts.push(award(100 + i, "LONER", "PTRI", 10.0));
    }
    let set = run(contracts);

    assert_eq!(set.suppliers.get(&key("LONER"), "risky_market_share_by_count"), None);
    assert_eq!(set.suppliers.get(&key("LONER"), "risky_market_share_by_amount"), None);
    assert!(set.suppliers.column_index("share_by_count_ptri_goods").is_none());
    assert_eq!(set.suppliers.get(&key("LONER"), "share_by_count_pep_goods"), Some(0.0));
}

#[test]
fn test_consortium_member_shares_contract() {
    let mut contracts = dominated_segment();
    contracts[5] = award(5, "ALPHA / ZULU", "PEP", 100.0);
    let set = run(contracts);

    // The contract counts once for each member, the segment still has ten
    assert_eq!(set.suppliers.get(&key("ZULU"), "share_by_count_pep_goods"), Some(0.1));
    assert_eq!(set.suppliers.get(&key("ZULU"), "share_by_amount_pep_goods"), Some(0.05));
}

// ============================================================================
// Amount-based shares
// ============================================================================

#[test]
fn test_amount_shares_flag_top_decile() {
    let contracts: Vec<ContractRecord> = (1..=20)
        .map(|i| award(i, &format!("SUPPLIER {}", i), "PEP", i as f64))
        .collect();
    let set = run(contracts);

    let flagged: Vec<String> = set
        .suppliers
        .rows()
        .filter(|(k, _)| set.suppliers.get(k, "risky_market_share_by_amount") == Some(1.0))
        .map(|(k, _)| k.to_string())
        .collect();
    assert_eq!(flagged, vec!["SUPPLIER 19".to_string(), "SUPPLIER 20".to_string()]);

    // Equal counts: nothing is strictly above the quantile
    let by_count = set.suppliers.column("risky_market_share_by_count").unwrap();
    assert!(by_count.iter().all(|v| *v == Some(0.0)));
}

#[test]
fn test_segment_without_positive_amount() {
    let contracts: Vec<ContractRecord> = (0..6)
        .map(|i| ContractRecord::new(format!("EV-{}", i), format!("C-{}", i), "NOBODY").with_segment("PEP", "Goods"))
        .collect();
    let set = run(contracts);

    assert_eq!(set.suppliers.get(&key("NOBODY"), "risky_market_share_by_amount"), None);
    assert_eq!(set.suppliers.get(&key("NOBODY"), "risky_market_share_by_count"), Some(0.0));
}
