//! Tests for the date-interval and amendment calculators (contract grain)

use chrono::{Duration, NaiveDate};
use procurement_risk_core::models::{ContractKey, ContractRecord};
use procurement_risk_core::pipeline::{FeatureSet, PipelineConfig, PipelineInputs, RiskPipeline};

// ============================================================================
// Test Helpers
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn features(contracts: Vec<ContractRecord>) -> FeatureSet {
    RiskPipeline::new(PipelineConfig::default())
        .unwrap()
        .compute_features(&PipelineInputs::new(contracts))
        .unwrap()
}

fn delivery(contract: &str, supplier: &str, subject: &str, days: i64) -> ContractRecord {
    let start = date(2020, 1, 1);
    ContractRecord::new("EV-1", contract, supplier)
        .with_segment("PEP", subject)
        .with_delivery_period(start, start + Duration::days(days))
}

fn key(contract: &str) -> ContractKey {
    ContractKey::new("EV-1", contract)
}

// ============================================================================
// Short delivery period
// ============================================================================

#[test]
fn test_shortest_delivery_in_category_flagged() {
    let set = features(vec![
        delivery("C-1", "A", "Goods", 5),
        delivery("C-2", "B", "Goods", 30),
        delivery("C-3", "C", "Goods", 40),
        delivery("C-4", "D", "Goods", 50),
        delivery("C-5", "E", "Goods", 60),
    ]);
    let table = &set.contracts;

    // 10th percentile of [5, 30, 40, 50, 60] is 15
    assert_eq!(table.get(&key("C-1"), "short_delivery_period"), Some(1.0));
    for contract in ["C-2", "C-3", "C-4", "C-5"] {
        assert_eq!(table.get(&key(contract), "short_delivery_period"), Some(0.0));
    }
    assert_eq!(table.get(&key("C-1"), "delivery_days"), Some(5.0));
}

#[test]
fn test_missing_dates_unflagged_and_empty_categories_null() {
    let set = features(vec![
        delivery("C-1", "A", "Goods", 5),
        delivery("C-2", "B", "Goods", 30),
        ContractRecord::new("EV-1", "C-3", "C").with_segment("PEP", "Goods"),
        ContractRecord::new("EV-1", "C-4", "D").with_segment("PEP", "Services"),
    ]);
    let table = &set.contracts;

    assert_eq!(table.len(), 4);
    // Goods has a threshold: a missing interval is not short
    assert_eq!(table.get(&key("C-3"), "short_delivery_period"), Some(0.0));
    assert_eq!(table.get(&key("C-3"), "delivery_days"), None);
    // Services has no observed interval, hence no threshold
    assert_eq!(table.get(&key("C-4"), "short_delivery_period"), None);
}

#[test]
fn test_consortium_rows_collapse_to_one_contract() {
    let set = features(vec![
        delivery("C-1", "A / B / C", "Goods", 5),
        delivery("C-2", "D", "Goods", 30),
    ]);
    assert_eq!(set.contracts.len(), 2);
    assert_eq!(set.joined.len(), 4);
    assert_eq!(set.contracts.get(&key("C-1"), "short_delivery_period"), Some(1.0));
}

#[test]
fn test_subject_alias_merges_categories() {
    let contracts = vec![
        delivery("C-1", "A", "Public Works", 10),
        delivery("C-2", "B", "Public Works", 20),
        delivery("C-3", "C", "Public Works", 30),
        delivery("C-4", "D", "Dos Bocas", 2),
    ];

    // Aliased: threshold over [2, 10, 20, 30] is 4.4, so 2 days is short
    let set = features(contracts.clone());
    assert_eq!(set.contracts.get(&key("C-4"), "short_delivery_period"), Some(1.0));

    // Without the alias "Dos Bocas" is its own one-contract category
    let mut config = PipelineConfig::default();
    config.preparation.subject_aliases.clear();
    let set = RiskPipeline::new(config)
        .unwrap()
        .compute_features(&PipelineInputs::new(contracts))
        .unwrap();
    assert_eq!(set.contracts.get(&key("C-4"), "short_delivery_period"), Some(0.0));
}

#[test]
fn test_min_observations_leaves_small_categories_null() {
    let mut config = PipelineConfig::default();
    config.features.intervals.min_observations = 3;
    let set = RiskPipeline::new(config)
        .unwrap()
        .compute_features(&PipelineInputs::new(vec![
            delivery("C-1", "A", "Goods", 5),
            delivery("C-2", "B", "Goods", 30),
        ]))
        .unwrap();
    assert_eq!(set.contracts.get(&key("C-1"), "short_delivery_period"), None);
    assert_eq!(set.contracts.get(&key("C-1"), "delivery_days"), Some(5.0));
}

// ============================================================================
// Meeting and contract intervals
// ============================================================================

#[test]
fn test_meeting_and_contract_intervals() {
    let publication = date(2019, 3, 1);
    let contracts: Vec<ContractRecord> = [(2, 30), (10, 40), (12, 45), (15, 60)]
        .iter()
        .enumerate()
        .map(|(i, (to_meeting, to_contract))| {
            let meeting = publication + Duration::days(*to_meeting);
            ContractRecord::new("EV-1", format!("C-{}", i + 1), format!("SUPPLIER {}", i))
                .with_segment("PEP", "Services")
                .with_publication_date(publication)
                .with_meeting_date(meeting)
                .with_contract_date(meeting + Duration::days(*to_contract))
        })
        .collect();
    let set = features(contracts);
    let table = &set.contracts;

    assert_eq!(table.get(&key("C-1"), "days_publication_to_meeting"), Some(2.0));
    assert_eq!(table.get(&key("C-1"), "short_meeting_after_publication"), Some(1.0));
    assert_eq!(table.get(&key("C-2"), "short_meeting_after_publication"), Some(0.0));
    assert_eq!(table.get(&key("C-1"), "days_meeting_to_contract"), Some(30.0));
    assert_eq!(table.get(&key("C-1"), "short_contract_after_meeting"), Some(1.0));
    assert_eq!(table.get(&key("C-4"), "short_contract_after_meeting"), Some(0.0));
}

// ============================================================================
// Amendments
// ============================================================================

#[test]
fn test_amendment_answers() {
    let set = features(vec![
        ContractRecord::new("EV-1", "C-1", "A").with_amendments("Sí"),
        ContractRecord::new("EV-1", "C-2", "B").with_amendments("No"),
        ContractRecord::new("EV-1", "C-3", "C").with_amendments("tal vez"),
        ContractRecord::new("EV-1", "C-4", "D"),
        ContractRecord::new("EV-1", "C-5", "E / F").with_amendments("si"),
    ]);
    let table = &set.contracts;

    assert_eq!(table.get(&key("C-1"), "had_amendments"), Some(1.0));
    assert_eq!(table.get(&key("C-2"), "had_amendments"), Some(0.0));
    assert_eq!(table.get(&key("C-3"), "had_amendments"), None);
    assert_eq!(table.get(&key("C-4"), "had_amendments"), None);
    assert_eq!(table.get(&key("C-5"), "had_amendments"), Some(1.0));
}
