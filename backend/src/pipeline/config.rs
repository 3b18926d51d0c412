//! Pipeline configuration
//!
//! One serde document configures a run. Every field has a default, so an
//! empty JSON object `{}` is a valid configuration:
//!
//! ```json
//! {
//!   "preparation": { "subject_aliases": { "Dos Bocas": "Public Works" } },
//!   "features": { "market": { "quantile": 0.9, "min_segment_contracts": 6 } },
//!   "weights": { "sanctioned": 3, "single_bid": 2 }
//! }
//! ```
//!
//! A partial `weights` map is completed with the registry defaults by
//! [`PipelineConfig::from_json`]; a map built in code must name every
//! indicator.

use crate::entity::base::PreparationConfig;
use crate::features::FeatureConfig;
use crate::scoring::indicator::Indicator;
use crate::scoring::weights::{ConfigError, WeightTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preparation: PreparationConfig,
    pub features: FeatureConfig,
    pub weights: WeightTable,
}

impl PipelineConfig {
    /// Parse a JSON configuration, filling unspecified weights with defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: PipelineConfig = serde_json::from_str(json)?;
        for indicator in Indicator::ALL {
            config
                .weights
                .0
                .entry(indicator.name().to_string())
                .or_insert(indicator.default_weight());
        }
        Ok(config)
    }

    /// Check weights and numeric parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.resolve()?;

        let features = &self.features;
        check_quantile("intervals.quantile", features.intervals.quantile)?;
        check_quantile("market.quantile", features.market.quantile)?;
        check_unit("supplier.success_rate_threshold", features.supplier.success_rate_threshold)?;
        check_unit("collusion.co_bid_ratio", features.collusion.co_bid_ratio)?;
        check_unit("collusion.win_rate", features.collusion.win_rate)?;

        if !(features.procedure.amount_tolerance >= 0.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "procedure.amount_tolerance must be non-negative, got {}",
                features.procedure.amount_tolerance
            )));
        }
        if features.market.min_segment_contracts == 0 {
            return Err(ConfigError::InvalidParameter(
                "market.min_segment_contracts must be at least 1".to_string(),
            ));
        }
        if features.collusion.min_appearances == 0 {
            return Err(ConfigError::InvalidParameter(
                "collusion.min_appearances must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_quantile(name: &str, q: f64) -> Result<(), ConfigError> {
    check_unit(name, q)
}

fn check_unit(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}
