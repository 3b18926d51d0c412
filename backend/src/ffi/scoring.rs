//! PyO3 functions for scoring
//!
//! # Example (from Python)
//!
//! ```python
//! import json
//! from procurement_risk_core import score_contracts
//!
//! inputs = {"contracts": [{"event_id": "EV-1", "contract_number": "C-1",
//!                          "supplier_name": "ACME SA DE CV", "amount": 1e6}]}
//! csv_text = score_contracts(json.dumps(inputs))
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::output::{joined_to_string, scored_to_string};
use crate::pipeline::{PipelineConfig, PipelineError, PipelineInputs, RiskPipeline};

fn parse_inputs(inputs_json: &str) -> PyResult<PipelineInputs> {
    serde_json::from_str(inputs_json)
        .map_err(|e| PyValueError::new_err(format!("Invalid inputs: {}", e)))
}

fn build_pipeline(config_json: Option<&str>) -> PyResult<RiskPipeline> {
    let config = match config_json {
        Some(json) => PipelineConfig::from_json(json)
            .map_err(|e| PyValueError::new_err(format!("Invalid configuration: {}", e)))?,
        None => PipelineConfig::default(),
    };
    RiskPipeline::new(config).map_err(pipeline_error)
}

fn pipeline_error(e: PipelineError) -> PyErr {
    match e {
        PipelineError::Config(e) => PyValueError::new_err(format!("Invalid configuration: {}", e)),
        other => PyRuntimeError::new_err(format!("Pipeline failed: {}", other)),
    }
}

/// Score every contract and return the scored table as CSV text
#[pyfunction]
#[pyo3(signature = (inputs_json, config_json=None))]
pub fn score_contracts(inputs_json: &str, config_json: Option<&str>) -> PyResult<String> {
    let pipeline = build_pipeline(config_json)?;
    let inputs = parse_inputs(inputs_json)?;
    let output = pipeline.run(&inputs).map_err(pipeline_error)?;
    scored_to_string(&output.scored)
        .map_err(|e| PyRuntimeError::new_err(format!("Failed to write output: {}", e)))
}

/// Compute the wide (un-aggregated) feature table and return it as CSV text
#[pyfunction]
#[pyo3(signature = (inputs_json, config_json=None))]
pub fn feature_table(inputs_json: &str, config_json: Option<&str>) -> PyResult<String> {
    let pipeline = build_pipeline(config_json)?;
    let inputs = parse_inputs(inputs_json)?;
    let features = pipeline.compute_features(&inputs).map_err(pipeline_error)?;
    joined_to_string(&features.joined)
        .map_err(|e| PyRuntimeError::new_err(format!("Failed to write output: {}", e)))
}
