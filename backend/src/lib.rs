//! Procurement Risk Core - Rust Engine
//!
//! Rule-based fraud-risk scoring of public-procurement contracts. Disclosure
//! records, bid rosters, a secondary portal and several reference lists are
//! combined into binary indicators at three grains (contract, procedure,
//! supplier), folded onto contracts and weighted into one score.
//!
//! # Architecture
//!
//! - **core**: Name normalization, tax-ID and date helpers
//! - **models**: Domain types (records, keys, feature tables, reference lists)
//! - **entity**: Consortium expansion and base-table preparation
//! - **stats**: Quantiles and segmented thresholds
//! - **features**: Per-grain feature calculators
//! - **scoring**: Indicator registry, weights, aggregation and scoring
//! - **pipeline**: Configuration and the end-to-end run
//! - **output**: CSV / JSON artifacts
//!
//! # Critical Invariants
//!
//! 1. Every feature table has exactly one row per key of its grain's
//!    population
//! 2. Consortium expansion conserves amounts
//! 3. Runs are deterministic: ordered maps everywhere, no hidden state

// Module declarations
pub mod core;
pub mod entity;
pub mod features;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod scoring;
pub mod stats;

// Re-exports for convenience
pub use crate::core::names::normalize_name;
pub use entity::{expand_consortia, BaseTable, Populations, PreparationConfig};
pub use features::{FeatureConfig, FeatureContext};
pub use models::{
    ContractKey, ContractRecord, FeatureTable, FeatureTableError, Grain, ProcedureKey,
    ProcedureType, ReferenceTables, SupplierKey,
};
pub use output::OutputError;
pub use pipeline::{
    PipelineConfig, PipelineError, PipelineInputs, PipelineOutput, RiskPipeline, RunReport,
};
pub use scoring::{ConfigError, Indicator, ScoredContract, WeightTable};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn procurement_risk_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::scoring::score_contracts, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::scoring::feature_table, m)?)?;
    Ok(())
}
