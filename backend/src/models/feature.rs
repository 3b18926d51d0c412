//! Feature tables
//!
//! A [`FeatureTable`] holds one or more named columns of nullable values for
//! every key of one grain. Indicator columns hold 0/1, audit columns hold
//! continuous values (shares, day counts, rates).
//!
//! # Critical Invariants
//!
//! 1. **One row per population key**: a table produced for a grain has
//!    exactly the keys of that grain's population. Missing data is a `None`
//!    cell, never a missing row.
//! 2. **Rectangular**: every row has one value per column.
//! 3. **Deterministic order**: rows iterate in key order.

use crate::models::keys::{Grain, GrainKey};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors raised when feature tables do not line up with their population
#[derive(Debug, Error, PartialEq)]
pub enum FeatureTableError {
    #[error(
        "{grain} feature tables do not match the expected row count {expected}; shapes: {}",
        format_shapes(.shapes)
    )]
    CardinalityMismatch {
        grain: Grain,
        expected: usize,
        shapes: Vec<(String, usize)>,
    },

    #[error("{grain} feature table '{table}' has no row for key {key}")]
    MissingKey {
        grain: Grain,
        table: String,
        key: String,
    },

    #[error("column '{column}' appears in more than one {grain} feature table")]
    DuplicateColumn { grain: Grain, column: String },
}

fn format_shapes(shapes: &[(String, usize)]) -> String {
    shapes
        .iter()
        .map(|(name, rows)| format!("{}={}", name, rows))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Nullable feature values for every key of a grain
///
/// # Example
/// ```
/// use procurement_risk_core::models::{FeatureTable, SupplierKey};
///
/// let mut table = FeatureTable::new("sanctioned", &["sanctioned"]);
/// table.insert(SupplierKey::new("ACME"), vec![Some(1.0)]);
/// table.insert(SupplierKey::new("BETA"), vec![None]);
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.get(&SupplierKey::new("ACME"), "sanctioned"), Some(1.0));
/// assert_eq!(table.get(&SupplierKey::new("BETA"), "sanctioned"), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable<K: GrainKey> {
    /// Name of the calculator that produced the table
    name: String,

    columns: Vec<String>,

    rows: BTreeMap<K, Vec<Option<f64>>>,
}

impl<K: GrainKey> FeatureTable<K> {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::with_columns(name, columns.iter().map(|c| c.to_string()).collect())
    }

    pub fn with_columns(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Insert (or replace) the row for `key`
    ///
    /// # Panics
    /// Panics if `values` does not have one entry per column
    pub fn insert(&mut self, key: K, values: Vec<Option<f64>>) {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "row width must match column count of '{}'",
            self.name
        );
        self.rows.insert(key, values);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grain(&self) -> Grain {
        K::GRAIN
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.rows.keys()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&K, &[Option<f64>])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn row(&self, key: &K) -> Option<&[Option<f64>]> {
        self.rows.get(key).map(|v| v.as_slice())
    }

    /// Value of `column` for `key`; `None` for a null cell, unknown key or column
    pub fn get(&self, key: &K, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(key).and_then(|row| row[idx])
    }

    /// Values of one column in key order
    pub fn column(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(column)?;
        Some(self.rows.values().map(|row| row[idx]).collect())
    }

    /// Keep only the named columns (in the given order)
    pub fn select(&self, columns: &[&str]) -> Self {
        let indices: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let mut selected = Self::new(self.name.clone(), columns);
        for (key, row) in &self.rows {
            let values = indices
                .iter()
                .map(|idx| idx.and_then(|i| row[i]))
                .collect();
            selected.rows.insert(key.clone(), values);
        }
        selected
    }

    /// Check that the table has exactly the population's keys
    pub fn ensure_population(&self, population: &BTreeSet<K>) -> Result<(), FeatureTableError> {
        if self.rows.len() != population.len() {
            return Err(FeatureTableError::CardinalityMismatch {
                grain: K::GRAIN,
                expected: population.len(),
                shapes: vec![(self.name.clone(), self.rows.len())],
            });
        }
        if let Some(missing) = population.iter().find(|k| !self.rows.contains_key(k)) {
            return Err(FeatureTableError::MissingKey {
                grain: K::GRAIN,
                table: self.name.clone(),
                key: format!("{:?}", missing),
            });
        }
        Ok(())
    }

    /// Column-wise concatenation of tables of the same grain
    ///
    /// Every table must have exactly `population`'s keys. When any table has
    /// the wrong row count the error lists the shapes of all tables.
    pub fn concat(
        name: impl Into<String>,
        tables: Vec<FeatureTable<K>>,
        population: &BTreeSet<K>,
    ) -> Result<Self, FeatureTableError> {
        if tables.iter().any(|t| t.len() != population.len()) {
            return Err(FeatureTableError::CardinalityMismatch {
                grain: K::GRAIN,
                expected: population.len(),
                shapes: tables.iter().map(|t| (t.name.clone(), t.len())).collect(),
            });
        }
        for table in &tables {
            table.ensure_population(population)?;
        }

        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if columns.contains(column) {
                    return Err(FeatureTableError::DuplicateColumn {
                        grain: K::GRAIN,
                        column: column.clone(),
                    });
                }
                columns.push(column.clone());
            }
        }

        let mut merged = Self::with_columns(name, columns);
        for key in population {
            let mut values = Vec::with_capacity(merged.columns.len());
            for table in &tables {
                // Presence was checked by ensure_population above
                if let Some(row) = table.rows.get(key) {
                    values.extend_from_slice(row);
                }
            }
            merged.rows.insert(key.clone(), values);
        }
        Ok(merged)
    }
}

/// Encode an optional flag as a feature value
pub fn flag_value(flag: Option<bool>) -> Option<f64> {
    flag.map(|f| if f { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::keys::SupplierKey;

    fn population(keys: &[&str]) -> BTreeSet<SupplierKey> {
        keys.iter().map(|k| SupplierKey::new(*k)).collect()
    }

    #[test]
    fn test_concat_reports_all_shapes() {
        let mut a = FeatureTable::new("a", &["a"]);
        a.insert(SupplierKey::new("X"), vec![Some(1.0)]);
        a.insert(SupplierKey::new("Y"), vec![Some(0.0)]);
        let mut b = FeatureTable::new("b", &["b"]);
        b.insert(SupplierKey::new("X"), vec![Some(1.0)]);

        let err = FeatureTable::concat("all", vec![a, b], &population(&["X", "Y"])).unwrap_err();
        assert_eq!(
            err,
            FeatureTableError::CardinalityMismatch {
                grain: Grain::Supplier,
                expected: 2,
                shapes: vec![("a".to_string(), 2), ("b".to_string(), 1)],
            }
        );
        assert!(err.to_string().contains("a=2, b=1"));
    }

    #[test]
    fn test_same_count_but_different_keys_is_rejected() {
        let mut a = FeatureTable::new("a", &["a"]);
        a.insert(SupplierKey::new("X"), vec![Some(1.0)]);
        a.insert(SupplierKey::new("Z"), vec![Some(1.0)]);

        let err = a.ensure_population(&population(&["X", "Y"])).unwrap_err();
        assert!(matches!(err, FeatureTableError::MissingKey { .. }));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut a = FeatureTable::new("a", &["flag"]);
        a.insert(SupplierKey::new("X"), vec![Some(1.0)]);
        let mut b = FeatureTable::new("b", &["flag"]);
        b.insert(SupplierKey::new("X"), vec![Some(0.0)]);

        let err = FeatureTable::concat("all", vec![a, b], &population(&["X"])).unwrap_err();
        assert!(matches!(err, FeatureTableError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_select_keeps_order_and_fills_unknown_columns() {
        let mut a = FeatureTable::new("a", &["x", "y"]);
        a.insert(SupplierKey::new("K"), vec![Some(1.0), Some(2.0)]);
        let selected = a.select(&["y", "missing"]);
        assert_eq!(selected.columns(), &["y".to_string(), "missing".to_string()]);
        assert_eq!(selected.row(&SupplierKey::new("K")), Some(&[Some(2.0), None][..]));
    }
}
