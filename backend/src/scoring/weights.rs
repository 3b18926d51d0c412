//! Indicator weights
//!
//! Weights are configured by indicator name. A weight table must name every
//! indicator exactly once, only known indicators, and only weights in
//! `{1, 2, 3}`; anything else is a configuration error.

use crate::scoring::indicator::Indicator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Smallest allowed weight
pub const MIN_WEIGHT: u8 = 1;

/// Largest allowed weight
pub const MAX_WEIGHT: u8 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown indicator '{0}' in weight table")]
    UnknownIndicator(String),

    #[error("weight table has no entry for indicator '{0}'")]
    MissingWeight(String),

    #[error("weight {weight} for indicator '{indicator}' is outside {min}..={max}")]
    InvalidWeight {
        indicator: String,
        weight: u8,
        min: u8,
        max: u8,
    },

    #[error("invalid configuration: {0}")]
    InvalidParameter(String),
}

/// Weight per indicator name, as found in configuration files
///
/// # Example
/// ```
/// use procurement_risk_core::scoring::{Indicator, WeightTable};
///
/// let table = WeightTable::default();
/// let weights = table.resolve().unwrap();
/// assert_eq!(weights.weight(Indicator::Sanctioned), 3);
/// assert_eq!(weights.weight(Indicator::HadAmendments), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(pub BTreeMap<String, u8>);

impl Default for WeightTable {
    fn default() -> Self {
        Self(
            Indicator::ALL
                .iter()
                .map(|i| (i.name().to_string(), i.default_weight()))
                .collect(),
        )
    }
}

impl WeightTable {
    /// Override one weight (by indicator name)
    pub fn with_weight(mut self, indicator: impl Into<String>, weight: u8) -> Self {
        self.0.insert(indicator.into(), weight);
        self
    }

    /// Validate the table and map it onto the registry
    pub fn resolve(&self) -> Result<ResolvedWeights, ConfigError> {
        for name in self.0.keys() {
            if Indicator::from_name(name).is_none() {
                return Err(ConfigError::UnknownIndicator(name.clone()));
            }
        }

        let mut weights = [0u8; Indicator::COUNT];
        for (idx, indicator) in Indicator::ALL.iter().enumerate() {
            let weight = *self
                .0
                .get(indicator.name())
                .ok_or_else(|| ConfigError::MissingWeight(indicator.name().to_string()))?;
            if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
                return Err(ConfigError::InvalidWeight {
                    indicator: indicator.name().to_string(),
                    weight,
                    min: MIN_WEIGHT,
                    max: MAX_WEIGHT,
                });
            }
            weights[idx] = weight;
        }
        Ok(ResolvedWeights { weights })
    }
}

/// Validated weights indexed in registry order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWeights {
    weights: [u8; Indicator::COUNT],
}

impl ResolvedWeights {
    pub fn weight(&self, indicator: Indicator) -> u8 {
        // ALL covers every variant
        Indicator::ALL
            .iter()
            .position(|i| *i == indicator)
            .map_or(0, |idx| self.weights[idx])
    }

    /// Weights in [`Indicator::ALL`] order
    pub fn as_slice(&self) -> &[u8] {
        &self.weights
    }
}
