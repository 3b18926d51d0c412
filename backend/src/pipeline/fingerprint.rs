//! Configuration fingerprint
//!
//! A run report carries a SHA-256 hash of the configuration so two reports
//! can be compared without diffing configs. The hash is computed over a
//! canonical JSON rendering (object keys sorted recursively), so it does not
//! depend on field order.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Hex SHA-256 of the canonical JSON form of `config`
///
/// # Example
/// ```
/// use procurement_risk_core::pipeline::{config_fingerprint, PipelineConfig};
///
/// let a = config_fingerprint(&PipelineConfig::default()).unwrap();
/// let b = config_fingerprint(&PipelineConfig::default()).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn config_fingerprint<T: Serialize>(config: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(config)?;
    let json = serde_json::to_string(&canonicalize(value))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
