//! End-to-end risk scoring pipeline
//!
//! - **config**: serde configuration with defaults and validation
//! - **fingerprint**: canonical SHA-256 of the configuration
//! - **engine**: [`RiskPipeline`], which prepares, computes, joins and scores

pub mod config;
pub mod engine;
pub mod fingerprint;

pub use config::PipelineConfig;
pub use engine::{
    FeatureSet, PipelineError, PipelineInputs, PipelineOutput, PopulationSizes, RiskPipeline,
    RunReport,
};
pub use fingerprint::config_fingerprint;
