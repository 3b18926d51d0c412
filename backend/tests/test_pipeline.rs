//! End-to-end pipeline tests

use chrono::NaiveDate;
use procurement_risk_core::models::{
    BidRecord, ContractKey, ContractRecord, GhostCompanyEntry, GhostStatus, ProcedureType,
    ReferenceEntry, ReferenceTables, SecondaryRecord,
};
use procurement_risk_core::output::{
    joined_to_string, scored_header, scored_to_string, write_report_file, write_scored_file,
};
use procurement_risk_core::pipeline::{PipelineConfig, PipelineError, PipelineInputs, RiskPipeline};
use procurement_risk_core::scoring::{ConfigError, Indicator};
use std::collections::BTreeSet;

// ============================================================================
// Test Helpers
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A small disclosure with a consortium, a direct award, an unknown winner
/// and a handful of side tables
fn sample_inputs() -> PipelineInputs {
    let contracts = vec![
        ContractRecord::new("EV-1", "C-1", "ACME SA DE CV / BETA SC")
            .with_tax_id("ACM100101AA1")
            .with_segment("PEP", "Public Works")
            .with_procedure_type(ProcedureType::OpenTender)
            .with_amount(2_000_000.0)
            .with_publication_date(date(2019, 1, 1))
            .with_meeting_date(date(2019, 1, 10))
            .with_contract_date(date(2019, 3, 1)),
        ContractRecord::new("EV-2", "C-2", "Gamma, S.A. de C.V.")
            .with_tax_id("GAM190101AA1")
            .with_segment("PEP", "Goods")
            .with_procedure_type(ProcedureType::DirectAward)
            .with_amount(50_000.0)
            .with_delivery_period(date(2019, 2, 1), date(2019, 2, 3)),
        ContractRecord::new("EV-2", "C-3", "GAMMA")
            .with_segment("PEP", "Goods")
            .with_procedure_type(ProcedureType::DirectAward)
            .with_amendments("No"),
        ContractRecord {
            supplier_name: None,
            ..ContractRecord::new("EV-3", "C-4", "")
        },
    ];

    let references = ReferenceTables {
        registered_suppliers: vec![ReferenceEntry::named("ACME").with_tax_id("ACM100101AA1")],
        ghost_companies: vec![GhostCompanyEntry::new("GAMMA", "GAM190101AA1", GhostStatus::Presumed)],
        ..Default::default()
    };

    PipelineInputs::new(contracts)
        .with_bids(vec![
            BidRecord::new("C-1", "ACME SA DE CV / BETA SC"),
            BidRecord::new("C-1", "DELTA"),
        ])
        .with_secondary(vec![SecondaryRecord::new("EV-1").with_supplier("BETA / ACME")])
        .with_references(references)
}

fn pipeline() -> RiskPipeline {
    RiskPipeline::new(PipelineConfig::default()).unwrap()
}

// ============================================================================
// Shapes
// ============================================================================

#[test]
fn test_one_scored_row_per_contract() {
    let output = pipeline().run(&sample_inputs()).unwrap();

    let contracts: BTreeSet<ContractKey> = output.scored.iter().map(|s| s.contract.clone()).collect();
    assert_eq!(output.scored.len(), 4);
    assert_eq!(contracts, output.features.populations.contracts);
    assert!(output.scored.iter().all(|s| s.indicators.len() == Indicator::COUNT));
}

#[test]
fn test_populations_and_joined_rows() {
    let features = pipeline().compute_features(&sample_inputs()).unwrap();

    // Consortium award expands to two base rows
    assert_eq!(features.base_rows, 5);
    assert_eq!(features.populations.procedures.len(), 3);
    assert_eq!(features.populations.suppliers.len(), 3);
    // (C-1, ACME), (C-1, BETA), (C-2, GAMMA), (C-3, GAMMA), (C-4, unknown)
    assert_eq!(features.joined.len(), 5);
    for indicator in Indicator::ALL {
        assert!(
            features.joined.column_index(indicator.name()).is_some(),
            "joined table lacks {}",
            indicator
        );
    }
}

#[test]
fn test_consortium_amount_folds_back() {
    let output = pipeline().run(&sample_inputs()).unwrap();
    let consortium = output
        .scored
        .iter()
        .find(|s| s.contract == ContractKey::new("EV-1", "C-1"))
        .unwrap();

    assert_eq!(consortium.amount, Some(2_000_000.0));
    assert_eq!(consortium.indicator(Indicator::NotInSupplierRegistry), 1, "BETA is unregistered");
    assert_eq!(consortium.indicator(Indicator::CrossSourceDiscrepancy), 0);
    assert_eq!(consortium.indicator(Indicator::SingleBid), 0);
}

#[test]
fn test_unknown_winner_scores_zero() {
    let output = pipeline().run(&sample_inputs()).unwrap();
    let unknown = output
        .scored
        .iter()
        .find(|s| s.contract == ContractKey::new("EV-3", "C-4"))
        .unwrap();

    assert_eq!(unknown.amount, None);
    assert_eq!(unknown.log_monto_times_weighted_sum, None);
    assert_eq!(unknown.indicator(Indicator::Sanctioned), 0);
}

// ============================================================================
// Report
// ============================================================================

#[test]
fn test_report_counts() {
    let pipeline = pipeline();
    let output = pipeline.run(&sample_inputs()).unwrap();
    let report = &output.report;

    assert_eq!(report.config_fingerprint, pipeline.fingerprint());
    assert_eq!(report.config_fingerprint.len(), 64);
    assert_eq!(report.populations.contracts, 4);
    assert_eq!(report.flagged.len(), Indicator::COUNT);
    assert_eq!(report.flagged["reported_ghost_company"], 2, "both GAMMA contracts");
    assert!(report.scored_contracts <= 4);
}

#[test]
fn test_fingerprint_follows_configuration() {
    let default = pipeline();
    let mut config = PipelineConfig::default();
    config.features.market.quantile = 0.95;
    let changed = RiskPipeline::new(config).unwrap();

    assert_eq!(default.fingerprint(), pipeline().fingerprint());
    assert_ne!(default.fingerprint(), changed.fingerprint());
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_outputs_are_deterministic() {
    let inputs = sample_inputs();
    let first = pipeline().run(&inputs).unwrap();
    let second = pipeline().run(&inputs).unwrap();

    assert_eq!(
        scored_to_string(&first.scored).unwrap(),
        scored_to_string(&second.scored).unwrap()
    );
    assert_eq!(
        joined_to_string(&first.features.joined).unwrap(),
        joined_to_string(&second.features.joined).unwrap()
    );
    assert_ne!(first.report.run_id, second.report.run_id);
}

#[test]
fn test_write_scored_and_report_files() {
    let output = pipeline().run(&sample_inputs()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let scored_path = dir.path().join("scored.csv");
    let report_path = dir.path().join("report.json");

    write_scored_file(&scored_path, &output.scored).unwrap();
    write_report_file(&report_path, &output.report).unwrap();

    let csv = std::fs::read_to_string(&scored_path).unwrap();
    let header: Vec<String> = csv
        .lines()
        .next()
        .unwrap()
        .split(',')
        .map(|c| c.trim_matches('"').to_string())
        .collect();
    assert_eq!(header, scored_header());
    assert_eq!(csv.lines().count(), 1 + output.scored.len());

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["populations"]["contracts"], 4);
}

// ============================================================================
// Configuration and inputs
// ============================================================================

#[test]
fn test_inputs_from_json() {
    let json = r#"{
        "contracts": [
            {
                "event_id": "EV-1",
                "contract_number": "C-1",
                "supplier_name": "ACME SA DE CV",
                "procedure_type": "Licitación pública",
                "amount": 1000.0,
                "publication_date": "2019-01-01"
            }
        ],
        "references": {
            "ghost_companies": [
                { "name": "ACME", "tax_id": null, "status": "Definitivo" }
            ]
        }
    }"#;
    let inputs: PipelineInputs = serde_json::from_str(json).unwrap();
    assert_eq!(inputs.contracts[0].procedure_type, ProcedureType::OpenTender);

    let output = pipeline().run(&inputs).unwrap();
    assert_eq!(output.scored[0].indicator(Indicator::ReportedGhostCompany), 1);
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let mut config = PipelineConfig::default();
    config.features.market.quantile = 1.5;

    assert!(matches!(
        RiskPipeline::new(config),
        Err(PipelineError::Config(ConfigError::InvalidParameter(_)))
    ));
}

#[test]
fn test_empty_inputs() {
    let output = pipeline().run(&PipelineInputs::default()).unwrap();
    assert!(output.scored.is_empty());
    assert_eq!(output.report.scored_contracts, 0);
}
