//! Base table preparation
//!
//! Turns loader output into the contract-participant table every calculator
//! reads from, and derives the entity populations of the three grains.
//!
//! Preparation runs exactly once per pipeline run:
//! 1. Expand consortia (one row per member, amounts divided)
//! 2. Normalize supplier names and tax IDs
//! 3. Derive incorporation dates from tax IDs
//! 4. Alias anomalous subject-matter labels
//!
//! # Critical Invariants
//!
//! - Populations are computed from the prepared rows, never configured.
//!   Every calculator receives them explicitly and must emit one row per key.

use crate::core::tax_id::{incorporation_date, normalize_tax_id, DEFAULT_CENTURY_PIVOT};
use crate::entity::consortium::expand_consortia;
use crate::models::contract::{BaseRow, ContractRecord};
use crate::models::keys::{ContractKey, ProcedureKey, SupplierKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Options for base table preparation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreparationConfig {
    /// Subject-matter labels to rewrite before grouping (`from -> to`)
    pub subject_aliases: BTreeMap<String, String>,

    /// Two-digit tax ID years at or below this value are 20YY
    pub century_pivot: u32,
}

impl Default for PreparationConfig {
    fn default() -> Self {
        let mut subject_aliases = BTreeMap::new();
        subject_aliases.insert("Dos Bocas".to_string(), "Public Works".to_string());
        Self {
            subject_aliases,
            century_pivot: DEFAULT_CENTURY_PIVOT,
        }
    }
}

impl PreparationConfig {
    /// Subject category after aliasing
    pub fn subject_category(&self, subject_matter: &str) -> String {
        let trimmed = subject_matter.trim();
        self.subject_aliases
            .get(trimmed)
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }
}

/// Entity keys of each grain, computed once from the base table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Populations {
    pub contracts: BTreeSet<ContractKey>,
    pub procedures: BTreeSet<ProcedureKey>,
    pub suppliers: BTreeSet<SupplierKey>,
}

impl Populations {
    pub fn from_rows(rows: &[BaseRow]) -> Self {
        let mut populations = Self::default();
        for row in rows {
            populations.contracts.insert(row.contract_key());
            populations.procedures.insert(row.procedure_key());
            if let Some(key) = &row.supplier_key {
                populations.suppliers.insert(key.clone());
            }
        }
        populations
    }
}

/// Prepared contract-participant rows
#[derive(Debug, Clone, Default)]
pub struct BaseTable {
    rows: Vec<BaseRow>,
}

impl BaseTable {
    /// Prepare the base table from loader output
    ///
    /// # Example
    /// ```
    /// use procurement_risk_core::entity::base::{BaseTable, PreparationConfig};
    /// use procurement_risk_core::models::ContractRecord;
    ///
    /// let records = vec![
    ///     ContractRecord::new("EV-1", "C-1", "ACME SA DE CV / BETA SC").with_amount(100.0),
    ///     ContractRecord::new("EV-2", "C-2", "Gamma, S.A. de C.V.").with_amount(50.0),
    /// ];
    /// let base = BaseTable::prepare(&records, &PreparationConfig::default());
    ///
    /// assert_eq!(base.len(), 3);
    /// let populations = base.populations();
    /// assert_eq!(populations.contracts.len(), 2);
    /// assert_eq!(populations.suppliers.len(), 3);
    /// ```
    pub fn prepare(records: &[ContractRecord], config: &PreparationConfig) -> Self {
        let rows = expand_consortia(records)
            .into_iter()
            .map(|expanded| {
                let tax_id = expanded
                    .record
                    .supplier_tax_id
                    .as_deref()
                    .and_then(normalize_tax_id);
                let incorporation_date = tax_id
                    .as_deref()
                    .and_then(|id| incorporation_date(id, config.century_pivot));
                let subject_category = config.subject_category(&expanded.record.subject_matter);
                BaseRow {
                    record: expanded.record,
                    supplier_key: expanded.supplier_key,
                    tax_id,
                    incorporation_date,
                    subject_category,
                    consortium: expanded.consortium,
                }
            })
            .collect();
        Self { rows }
    }

    /// Wrap rows that were prepared elsewhere
    pub fn from_rows(rows: Vec<BaseRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[BaseRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn populations(&self) -> Populations {
        Populations::from_rows(&self.rows)
    }

    /// Rows that have a known supplier
    pub fn supplier_rows(&self) -> impl Iterator<Item = (&SupplierKey, &BaseRow)> {
        self.rows
            .iter()
            .filter_map(|row| row.supplier_key.as_ref().map(|key| (key, row)))
    }
}
