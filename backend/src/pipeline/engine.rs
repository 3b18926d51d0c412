//! Risk pipeline
//!
//! Runs the whole computation for one batch of inputs:
//!
//! ```text
//! 1. Prepare the base table (consortia expanded, names normalized)
//! 2. Compute populations once
//! 3. Index reference lists and the bid roster
//! 4. Run the supplier, procedure and contract calculators
//! 5. Check every grain's tables against its population
//! 6. Join onto the (contract, supplier) base population
//! 7. Fold to contracts, binarize and score
//! ```
//!
//! Every stage checks its shape; a mismatch aborts the run.
//!
//! # Example
//!
//! ```rust
//! use procurement_risk_core::models::{ContractRecord, ProcedureType};
//! use procurement_risk_core::pipeline::{PipelineConfig, PipelineInputs, RiskPipeline};
//!
//! let inputs = PipelineInputs::new(vec![
//!     ContractRecord::new("EV-1", "C-1", "ACME SA DE CV")
//!         .with_procedure_type(ProcedureType::DirectAward)
//!         .with_amount(1_000_000.0),
//! ]);
//!
//! let pipeline = RiskPipeline::new(PipelineConfig::default()).unwrap();
//! let output = pipeline.run(&inputs).unwrap();
//!
//! assert_eq!(output.scored.len(), 1);
//! assert_eq!(output.report.populations.contracts, 1);
//! ```

use crate::entity::base::{BaseTable, Populations};
use crate::features::{
    compute_grain, contract_calculators, procedure_calculators, supplier_calculators,
    AuxiliaryTables, BidRoster, FeatureContext,
};
use crate::models::contract::ContractRecord;
use crate::models::feature::{FeatureTable, FeatureTableError};
use crate::models::keys::{ContractKey, ProcedureKey, SupplierKey};
use crate::models::reference::{ReferenceIndex, ReferenceTables};
use crate::models::tables::{
    AttendanceRecord, BidRecord, PossibleBidderRecord, QuotationRecord, SecondaryRecord,
};
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::fingerprint::config_fingerprint;
use crate::scoring::aggregate::{
    base_population, fold_and_score, join_features, JoinedTable, ScoredContract, ScoringError,
};
use crate::scoring::indicator::Indicator;
use crate::scoring::weights::{ConfigError, ResolvedWeights};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("feature table error: {0}")]
    FeatureTable(#[from] FeatureTableError),

    #[error("scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("stage '{stage}' produced {actual} rows, expected {expected}")]
    StageShape {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// Inputs
// ============================================================================

/// Clean, already-parsed input tables of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineInputs {
    pub contracts: Vec<ContractRecord>,
    pub bids: Vec<BidRecord>,
    pub quotations: Vec<QuotationRecord>,
    pub attendance: Vec<AttendanceRecord>,
    pub possible_bidders: Vec<PossibleBidderRecord>,
    pub secondary: Vec<SecondaryRecord>,
    pub references: ReferenceTables,
}

impl PipelineInputs {
    pub fn new(contracts: Vec<ContractRecord>) -> Self {
        Self {
            contracts,
            ..Default::default()
        }
    }

    pub fn with_bids(mut self, bids: Vec<BidRecord>) -> Self {
        self.bids = bids;
        self
    }

    pub fn with_quotations(mut self, quotations: Vec<QuotationRecord>) -> Self {
        self.quotations = quotations;
        self
    }

    pub fn with_attendance(mut self, attendance: Vec<AttendanceRecord>) -> Self {
        self.attendance = attendance;
        self
    }

    pub fn with_possible_bidders(mut self, possible_bidders: Vec<PossibleBidderRecord>) -> Self {
        self.possible_bidders = possible_bidders;
        self
    }

    pub fn with_secondary(mut self, secondary: Vec<SecondaryRecord>) -> Self {
        self.secondary = secondary;
        self
    }

    pub fn with_references(mut self, references: ReferenceTables) -> Self {
        self.references = references;
        self
    }

    fn auxiliary(&self) -> AuxiliaryTables<'_> {
        AuxiliaryTables {
            bids: &self.bids,
            quotations: &self.quotations,
            attendance: &self.attendance,
            possible_bidders: &self.possible_bidders,
            secondary: &self.secondary,
        }
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// Number of keys per grain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopulationSizes {
    pub base_rows: usize,
    pub contracts: usize,
    pub procedures: usize,
    pub suppliers: usize,
}

/// Summary of a run, written next to the scored table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub config_fingerprint: String,
    pub populations: PopulationSizes,
    /// Contracts with each indicator set, by indicator name
    pub flagged: BTreeMap<String, usize>,
    /// Contracts with a non-null log score
    pub scored_contracts: usize,
}

/// Feature tables of the three grains plus their join
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub suppliers: FeatureTable<SupplierKey>,
    pub procedures: FeatureTable<ProcedureKey>,
    pub contracts: FeatureTable<ContractKey>,
    pub joined: JoinedTable,
    pub populations: Populations,
    pub base_rows: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub features: FeatureSet,
    pub scored: Vec<ScoredContract>,
    pub report: RunReport,
}

// ============================================================================
// Pipeline
// ============================================================================

/// A validated pipeline, reusable across input batches
#[derive(Debug, Clone)]
pub struct RiskPipeline {
    config: PipelineConfig,
    weights: ResolvedWeights,
    fingerprint: String,
}

impl RiskPipeline {
    /// Validate the configuration and build the pipeline
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let weights = config.weights.resolve()?;
        let fingerprint = config_fingerprint(&config)?;
        Ok(Self {
            config,
            weights,
            fingerprint,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Compute and join every feature table without scoring
    pub fn compute_features(&self, inputs: &PipelineInputs) -> Result<FeatureSet, PipelineError> {
        let base = BaseTable::prepare(&inputs.contracts, &self.config.preparation);
        let populations = base.populations();
        tracing::info!(
            records = inputs.contracts.len(),
            base_rows = base.len(),
            contracts = populations.contracts.len(),
            procedures = populations.procedures.len(),
            suppliers = populations.suppliers.len(),
            "prepared base table"
        );

        let aux = inputs.auxiliary();
        let references = ReferenceIndex::build(&inputs.references);
        let roster = BidRoster::build(aux.bids);
        tracing::debug!(
            roster_contracts = roster.num_contracts(),
            registered = references.registered_suppliers.num_names(),
            ghost = references.ghost_companies.num_names(),
            "indexed auxiliary tables"
        );

        let ctx = FeatureContext {
            base: &base,
            populations: &populations,
            roster: &roster,
            quotations: aux.quotations,
            attendance: aux.attendance,
            possible_bidders: aux.possible_bidders,
            secondary: aux.secondary,
            references: &references,
            config: &self.config.features,
        };

        let suppliers = compute_grain(
            "supplier_features",
            &supplier_calculators(),
            &ctx,
            &populations.suppliers,
        )?;
        let procedures = compute_grain(
            "procedure_features",
            &procedure_calculators(),
            &ctx,
            &populations.procedures,
        )?;
        let contracts = compute_grain(
            "contract_features",
            &contract_calculators(),
            &ctx,
            &populations.contracts,
        )?;

        let population = base_population(&base);
        let joined = join_features(population, &suppliers, &procedures, &contracts)?;
        tracing::info!(
            rows = joined.len(),
            columns = joined.columns.len(),
            "joined feature tables"
        );

        Ok(FeatureSet {
            suppliers,
            procedures,
            contracts,
            joined,
            base_rows: base.len(),
            populations,
        })
    }

    /// Run the full pipeline
    pub fn run(&self, inputs: &PipelineInputs) -> Result<PipelineOutput, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("risk_pipeline", run_id = %run_id);
        let _guard = span.enter();

        let features = self.compute_features(inputs)?;
        let scored = fold_and_score(&features.joined, &features.populations.contracts, &self.weights)?;
        if scored.len() != features.populations.contracts.len() {
            return Err(PipelineError::StageShape {
                stage: "score",
                expected: features.populations.contracts.len(),
                actual: scored.len(),
            });
        }

        let report = self.report(run_id, &features, &scored);
        tracing::info!(
            contracts = scored.len(),
            scored = report.scored_contracts,
            "scored contracts"
        );

        Ok(PipelineOutput {
            features,
            scored,
            report,
        })
    }

    fn report(&self, run_id: String, features: &FeatureSet, scored: &[ScoredContract]) -> RunReport {
        let flagged = Indicator::ALL
            .iter()
            .map(|indicator| {
                let count = scored.iter().filter(|s| s.indicator(*indicator) == 1).count();
                (indicator.name().to_string(), count)
            })
            .collect();

        RunReport {
            run_id,
            config_fingerprint: self.fingerprint.clone(),
            populations: PopulationSizes {
                base_rows: features.base_rows,
                contracts: features.populations.contracts.len(),
                procedures: features.populations.procedures.len(),
                suppliers: features.populations.suppliers.len(),
            },
            flagged,
            scored_contracts: scored
                .iter()
                .filter(|s| s.log_monto_times_weighted_sum.is_some())
                .count(),
        }
    }
}
