//! Indicator registry, weights, aggregation and scoring
//!
//! - **indicator**: the closed set of scored indicators and their grains
//! - **weights**: configured weights, validated against the registry
//! - **aggregate**: fold the per-grain feature tables onto contracts and score

pub mod aggregate;
pub mod indicator;
pub mod weights;

pub use aggregate::{
    base_population, fold_and_score, join_features, log_weighted_score, JoinedRow, JoinedTable,
    PopulationRow, ScoredContract, ScoringError,
};
pub use indicator::Indicator;
pub use weights::{ConfigError, ResolvedWeights, WeightTable, MAX_WEIGHT, MIN_WEIGHT};
