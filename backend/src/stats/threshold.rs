//! Segmented thresholds
//!
//! Several indicators flag an entity relative to its peers: a delivery
//! period shorter than the 10th percentile of its subject category, a
//! market share above the 90th percentile of its segment. This module
//! implements that once:
//!
//! 1. Partition observations by segment key
//! 2. Compute the quantile of each partition's non-null values
//! 3. Compare every observation against its own partition's threshold
//!
//! Partitions with fewer than `min_observations` non-null values have no
//! threshold; their observations are flagged `None` (undefined), never 0 or 1.

use crate::stats::quantile::quantile;
use std::collections::BTreeMap;

/// Which side of the threshold is flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdDirection {
    /// Flag values strictly below the threshold
    Below,
    /// Flag values strictly above the threshold
    Above,
}

impl ThresholdDirection {
    fn exceeds(&self, value: f64, threshold: f64) -> bool {
        match self {
            ThresholdDirection::Below => value < threshold,
            ThresholdDirection::Above => value > threshold,
        }
    }
}

/// Per-segment quantile thresholds
///
/// # Example
/// ```
/// use procurement_risk_core::stats::{SegmentedThreshold, ThresholdDirection};
///
/// let observations = vec![
///     ("Goods", Some(1.0)),
///     ("Goods", Some(10.0)),
///     ("Goods", Some(20.0)),
///     ("Services", None),
/// ];
/// let thresholds = SegmentedThreshold::fit(observations, 0.1, 1);
///
/// assert!(thresholds.threshold(&"Goods").is_some());
/// assert_eq!(thresholds.threshold(&"Services"), None);
/// assert_eq!(thresholds.flag(&"Goods", Some(1.0), ThresholdDirection::Below), Some(true));
/// assert_eq!(thresholds.flag(&"Goods", Some(20.0), ThresholdDirection::Below), Some(false));
/// assert_eq!(thresholds.flag(&"Services", Some(1.0), ThresholdDirection::Below), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedThreshold<S: Ord> {
    quantile: f64,
    thresholds: BTreeMap<S, Option<f64>>,
}

impl<S: Ord + Clone> SegmentedThreshold<S> {
    /// Fit thresholds from `(segment, value)` observations
    ///
    /// # Panics
    /// Panics if `q` is outside `[0, 1]`
    pub fn fit<I>(observations: I, q: f64, min_observations: usize) -> Self
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
    {
        let mut partitions: BTreeMap<S, Vec<f64>> = BTreeMap::new();
        for (segment, value) in observations {
            let values = partitions.entry(segment).or_default();
            if let Some(v) = value.filter(|v| !v.is_nan()) {
                values.push(v);
            }
        }

        let thresholds = partitions
            .into_iter()
            .map(|(segment, values)| {
                let threshold = if values.len() >= min_observations.max(1) {
                    quantile(&values, q)
                } else {
                    None
                };
                (segment, threshold)
            })
            .collect();

        Self {
            quantile: q,
            thresholds,
        }
    }

    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    /// Threshold of `segment`; `None` if undefined or the segment is unknown
    pub fn threshold(&self, segment: &S) -> Option<f64> {
        self.thresholds.get(segment).copied().flatten()
    }

    /// Flag one observation against its segment's threshold
    ///
    /// `None` when the value is missing or the segment has no threshold.
    pub fn flag(&self, segment: &S, value: Option<f64>, direction: ThresholdDirection) -> Option<bool> {
        let threshold = self.threshold(segment)?;
        let value = value.filter(|v| !v.is_nan())?;
        Some(direction.exceeds(value, threshold))
    }

    /// Segments whose threshold could not be computed
    pub fn undefined_segments(&self) -> Vec<&S> {
        self.thresholds
            .iter()
            .filter(|(_, t)| t.is_none())
            .map(|(s, _)| s)
            .collect()
    }

    pub fn num_segments(&self) -> usize {
        self.thresholds.len()
    }
}
