//! Quantiles with linear interpolation
//!
//! Matches the common "linear" definition: for sorted values `x` of length
//! `n`, the q-quantile is read at position `q * (n - 1)` and interpolated
//! between the two neighbouring order statistics.

/// q-quantile of the non-NaN values, `None` if there are none.
///
/// # Panics
/// Panics if `q` is outside `[0, 1]`
///
/// # Example
/// ```
/// use procurement_risk_core::stats::quantile;
///
/// assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5), Some(3.0));
/// assert_eq!(quantile(&[10.0, 20.0], 0.1), Some(11.0));
/// assert_eq!(quantile(&[], 0.9), None);
/// ```
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    assert!((0.0..=1.0).contains(&q), "quantile must be within [0, 1]");

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value() {
        assert_eq!(quantile(&[7.0], 0.1), Some(7.0));
    }

    #[test]
    fn test_nan_ignored() {
        assert_eq!(quantile(&[f64::NAN, 4.0, 2.0], 0.0), Some(2.0));
    }

    #[test]
    fn test_ninetieth_percentile() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let q = quantile(&values, 0.9).unwrap();
        assert!((q - 9.1).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "quantile must be within [0, 1]")]
    fn test_out_of_range_panics() {
        quantile(&[1.0], 1.5);
    }
}
