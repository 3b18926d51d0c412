//! Tests for aggregation and scoring

use procurement_risk_core::entity::{BaseTable, PreparationConfig};
use procurement_risk_core::features::{
    compute_grain, tabulate, BidRoster, Calculator, FeatureConfig, FeatureContext,
};
use procurement_risk_core::models::{
    BidRecord, ContractKey, ContractRecord, FeatureTable, FeatureTableError, Grain,
    ProcedureType, ReferenceEntry, ReferenceIndex, ReferenceTables, SecondaryRecord, SupplierKey,
};
use procurement_risk_core::pipeline::{PipelineConfig, PipelineError, PipelineInputs, RiskPipeline};
use procurement_risk_core::scoring::{
    fold_and_score, ConfigError, Indicator, JoinedRow, JoinedTable, PopulationRow, WeightTable,
};
use std::collections::BTreeSet;

// ============================================================================
// Test Helpers
// ============================================================================

/// One open tender to ACME with four indicators set:
/// sanctioned, single_bid, had_amendments, cross_source_discrepancy
fn flagged_contract() -> PipelineInputs {
    let contract = ContractRecord::new("EV-1", "C-1", "ACME SA DE CV")
        .with_tax_id("ACM100101AA1")
        .with_procedure_type(ProcedureType::OpenTender)
        .with_amount(1_000_000.0)
        .with_amendments("Si");

    let references = ReferenceTables {
        registered_suppliers: vec![ReferenceEntry::named("ACME").with_tax_id("ACM100101AA1")],
        sanctioned_suppliers: vec![ReferenceEntry::named("Acme, S.A. de C.V.")],
        ..Default::default()
    };

    PipelineInputs::new(vec![contract])
        .with_bids(vec![BidRecord::new("C-1", "ACME")])
        .with_secondary(vec![SecondaryRecord::new("EV-1").with_supplier("SOMEONE ELSE")])
        .with_references(references)
}

fn joined(rows: Vec<(ContractKey, Option<f64>, Vec<(Indicator, Option<f64>)>)>) -> JoinedTable {
    let columns: Vec<String> = Indicator::ALL.iter().map(|i| i.name().to_string()).collect();
    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(n, (contract, amount, set))| {
            let mut values = vec![None; Indicator::COUNT];
            for (indicator, value) in set {
                let idx = Indicator::ALL.iter().position(|i| *i == indicator).unwrap();
                values[idx] = value;
            }
            JoinedRow {
                population: PopulationRow {
                    contract,
                    supplier: Some(SupplierKey::new(format!("S{}", n))),
                    amount,
                },
                values,
            }
        })
        .collect();
    JoinedTable { columns, rows }
}

// ============================================================================
// End-to-end score
// ============================================================================

#[test]
fn test_weighted_log_score() {
    let pipeline = RiskPipeline::new(PipelineConfig::default()).unwrap();
    let output = pipeline.run(&flagged_contract()).unwrap();

    assert_eq!(output.scored.len(), 1);
    let scored = &output.scored[0];
    for indicator in [
        Indicator::Sanctioned,
        Indicator::SingleBid,
        Indicator::HadAmendments,
        Indicator::CrossSourceDiscrepancy,
    ] {
        assert_eq!(scored.indicator(indicator), 1, "{}", indicator);
    }
    assert_eq!(scored.sum_of_features, 4);
    assert_eq!(scored.weighted_sum_of_features, 7);

    let expected = 1_000_000f64.ln() * 7.0;
    let actual = scored.log_monto_times_weighted_sum.unwrap();
    assert!((actual - expected).abs() < 1e-9);
    assert!((actual - 96.709).abs() < 1e-3);
}

#[test]
fn test_custom_weights_change_score() {
    let mut config = PipelineConfig::default();
    config.weights = WeightTable::default().with_weight("had_amendments", 3);
    let output = RiskPipeline::new(config).unwrap().run(&flagged_contract()).unwrap();

    assert_eq!(output.scored[0].weighted_sum_of_features, 9);
}

// ============================================================================
// Fold
// ============================================================================

#[test]
fn test_fold_treats_nulls_as_zero_and_sums_consortium_amounts() {
    let contract = ContractKey::new("EV-1", "C-1");
    let other = ContractKey::new("EV-2", "C-2");
    let table = joined(vec![
        (contract.clone(), Some(50.0), vec![(Indicator::Sanctioned, None)]),
        (contract.clone(), Some(50.0), vec![(Indicator::Sanctioned, Some(1.0))]),
        (other.clone(), None, vec![(Indicator::SingleBid, Some(0.0))]),
    ]);
    let contracts: BTreeSet<ContractKey> = [contract.clone(), other.clone()].into_iter().collect();
    let weights = WeightTable::default().resolve().unwrap();

    let scored = fold_and_score(&table, &contracts, &weights).unwrap();

    assert_eq!(scored.len(), 2);
    assert_eq!(scored[0].contract, contract);
    assert_eq!(scored[0].amount, Some(100.0));
    assert_eq!(scored[0].indicator(Indicator::Sanctioned), 1);
    assert_eq!(scored[0].weighted_sum_of_features, 3);
    assert_eq!(scored[1].sum_of_features, 0);
    assert_eq!(scored[1].log_monto_times_weighted_sum, None, "missing amount");
}

#[test]
fn test_fold_detects_lost_contracts() {
    let table = joined(vec![(ContractKey::new("EV-1", "C-1"), Some(1.0), vec![])]);
    let contracts: BTreeSet<ContractKey> =
        [ContractKey::new("EV-1", "C-1"), ContractKey::new("EV-2", "C-2")]
            .into_iter()
            .collect();
    let weights = WeightTable::default().resolve().unwrap();

    assert!(fold_and_score(&table, &contracts, &weights).is_err());
}

// ============================================================================
// Weights
// ============================================================================

#[test]
fn test_weight_outside_range_is_rejected() {
    let mut config = PipelineConfig::default();
    config.weights = WeightTable::default().with_weight("single_bid", 4);

    match RiskPipeline::new(config) {
        Err(PipelineError::Config(ConfigError::InvalidWeight { indicator, weight, .. })) => {
            assert_eq!(indicator, "single_bid");
            assert_eq!(weight, 4);
        }
        other => panic!("expected invalid weight, got {:?}", other),
    }
}

#[test]
fn test_unknown_and_missing_weights_are_rejected() {
    let unknown = WeightTable::default().with_weight("bribery", 2);
    assert_eq!(
        unknown.resolve().unwrap_err(),
        ConfigError::UnknownIndicator("bribery".to_string())
    );

    let mut missing = WeightTable::default();
    missing.0.remove("sanctioned");
    assert_eq!(
        missing.resolve().unwrap_err(),
        ConfigError::MissingWeight("sanctioned".to_string())
    );
}

#[test]
fn test_partial_json_weights_are_completed() {
    let config = PipelineConfig::from_json(r#"{"weights": {"single_bid": 3}}"#).unwrap();
    let weights = config.weights.resolve().unwrap();

    assert_eq!(weights.weight(Indicator::SingleBid), 3);
    assert_eq!(weights.weight(Indicator::Sanctioned), 3);
    assert_eq!(weights.weight(Indicator::LowParticipation), 1);
}

// ============================================================================
// Shape errors
// ============================================================================

fn full_table(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    tabulate("full", &["full"], &ctx.populations.suppliers, |_| vec![Some(0.0)])
}

fn partial_table(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    let mut table = FeatureTable::new("partial", &["partial"]);
    if let Some(first) = ctx.populations.suppliers.iter().next() {
        table.insert(first.clone(), vec![Some(1.0)]);
    }
    table
}

#[test]
fn test_cardinality_mismatch_lists_every_table() {
    let records = vec![
        ContractRecord::new("EV-1", "C-1", "ACME"),
        ContractRecord::new("EV-2", "C-2", "BETA"),
    ];
    let base = BaseTable::prepare(&records, &PreparationConfig::default());
    let populations = base.populations();
    let roster = BidRoster::build(&[]);
    let references = ReferenceIndex::default();
    let config = FeatureConfig::default();
    let ctx = FeatureContext {
        base: &base,
        populations: &populations,
        roster: &roster,
        quotations: &[],
        attendance: &[],
        possible_bidders: &[],
        secondary: &[],
        references: &references,
        config: &config,
    };
    let calculators = vec![
        Calculator {
            name: "full",
            indicators: &[],
            compute: full_table,
        },
        Calculator {
            name: "partial",
            indicators: &[],
            compute: partial_table,
        },
    ];

    let err = compute_grain("supplier_features", &calculators, &ctx, &populations.suppliers)
        .unwrap_err();

    assert_eq!(
        err,
        FeatureTableError::CardinalityMismatch {
            grain: Grain::Supplier,
            expected: 2,
            shapes: vec![("full".to_string(), 2), ("partial".to_string(), 1)],
        }
    );
    assert!(err.to_string().contains("full=2, partial=1"));
}
