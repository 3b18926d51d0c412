//! Aggregation & scoring
//!
//! Folds the per-grain feature tables onto the contract grain and scores
//! every contract.
//!
//! # Stages
//!
//! ```text
//! base rows ──group (contract, supplier)──▶ base population (amount summed)
//!           ──left join supplier / procedure / contract features──▶ joined
//!           ──group contract, sum (null = 0)──▶ binarize (> 0)──▶ score
//! ```
//!
//! # Critical Invariants
//!
//! 1. **Row count preserved by joins**: the joined table has exactly one row
//!    per base-population row, and every key of that row has a row in its
//!    grain's feature table
//! 2. **One scored row per contract** of the contract population
//! 3. **Score**: `log_monto_times_weighted_sum = ln(amount) * weighted_sum`,
//!    null when the amount is missing or not positive

use crate::entity::base::BaseTable;
use crate::models::feature::FeatureTable;
use crate::models::keys::{ContractKey, Grain, GrainKey, ProcedureKey, SupplierKey};
use crate::scoring::indicator::Indicator;
use crate::scoring::weights::ResolvedWeights;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("stage '{stage}' produced {actual} rows, expected {expected}")]
    ShapeMismatch {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("joined feature table has no column for indicator '{0}'")]
    MissingIndicatorColumn(String),

    #[error("column '{0}' is produced at more than one grain")]
    DuplicateColumn(String),

    #[error("{grain} feature table has no row for '{key}'")]
    MissingJoinKey { grain: Grain, key: String },
}

// ============================================================================
// Base population
// ============================================================================

/// One (contract, supplier) pair with its summed amount
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationRow {
    pub contract: ContractKey,
    /// `None` groups the rows whose winner is unknown
    pub supplier: Option<SupplierKey>,
    pub amount: Option<f64>,
}

/// Group base rows at (event, contract number, supplier), summing amounts
///
/// # Example
/// ```
/// use procurement_risk_core::entity::base::{BaseTable, PreparationConfig};
/// use procurement_risk_core::models::ContractRecord;
/// use procurement_risk_core::scoring::aggregate::base_population;
///
/// let records = vec![
///     ContractRecord::new("EV-1", "C-1", "ACME / BETA").with_amount(100.0),
/// ];
/// let base = BaseTable::prepare(&records, &PreparationConfig::default());
/// let population = base_population(&base);
///
/// assert_eq!(population.len(), 2);
/// assert_eq!(population[0].amount, Some(50.0));
/// ```
pub fn base_population(base: &BaseTable) -> Vec<PopulationRow> {
    let mut groups: BTreeMap<(ContractKey, Option<SupplierKey>), Option<f64>> = BTreeMap::new();
    for row in base.rows() {
        let amount = groups
            .entry((row.contract_key(), row.supplier_key.clone()))
            .or_insert(None);
        if let Some(value) = row.record.amount {
            *amount = Some(amount.unwrap_or(0.0) + value);
        }
    }
    groups
        .into_iter()
        .map(|((contract, supplier), amount)| PopulationRow {
            contract,
            supplier,
            amount,
        })
        .collect()
}

// ============================================================================
// Join
// ============================================================================

/// A base-population row with every feature column attached
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub population: PopulationRow,
    pub values: Vec<Option<f64>>,
}

/// Base population left-joined with the supplier, procedure and contract
/// feature tables (in that column order)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinedTable {
    pub columns: Vec<String>,
    pub rows: Vec<JoinedRow>,
}

impl JoinedTable {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Join the three grains onto the base population
///
/// Every supplier, procedure and contract of the population must have a row
/// in its feature table; rows with an unknown winner get null supplier
/// columns.
pub fn join_features(
    population: Vec<PopulationRow>,
    suppliers: &FeatureTable<SupplierKey>,
    procedures: &FeatureTable<ProcedureKey>,
    contracts: &FeatureTable<ContractKey>,
) -> Result<JoinedTable, ScoringError> {
    let mut columns: Vec<String> = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for column in suppliers
        .columns()
        .iter()
        .chain(procedures.columns())
        .chain(contracts.columns())
    {
        if !seen.insert(column.as_str()) {
            return Err(ScoringError::DuplicateColumn(column.clone()));
        }
        columns.push(column.clone());
    }

    let width = columns.len();
    let rows = population
        .into_iter()
        .map(|population| {
            let mut values = Vec::with_capacity(width);
            let supplier_row = match &population.supplier {
                Some(supplier) => Some(required_row(suppliers, supplier)?),
                None => None,
            };
            extend_left(&mut values, supplier_row, suppliers.columns().len());
            let procedure_row = required_row(procedures, &population.contract.procedure())?;
            values.extend_from_slice(procedure_row);
            values.extend_from_slice(required_row(contracts, &population.contract)?);
            Ok(JoinedRow { population, values })
        })
        .collect::<Result<Vec<JoinedRow>, ScoringError>>()?;

    Ok(JoinedTable { columns, rows })
}

/// Feature row of a key that must have been computed
fn required_row<'t, K: GrainKey>(
    table: &'t FeatureTable<K>,
    key: &K,
) -> Result<&'t [Option<f64>], ScoringError> {
    table.row(key).ok_or_else(|| ScoringError::MissingJoinKey {
        grain: K::GRAIN,
        key: key.key_values().join("/"),
    })
}

/// Append a joined row, or nulls when the right side has no match
fn extend_left(values: &mut Vec<Option<f64>>, row: Option<&[Option<f64>]>, width: usize) {
    match row {
        Some(row) => values.extend_from_slice(row),
        None => values.extend(std::iter::repeat(None).take(width)),
    }
}

// ============================================================================
// Fold & score
// ============================================================================

/// Final per-contract result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredContract {
    pub contract: ContractKey,

    /// Binarized indicators in [`Indicator::ALL`] order
    pub indicators: Vec<u8>,

    pub amount: Option<f64>,
    pub sum_of_features: u32,
    pub weighted_sum_of_features: u32,
    pub log_monto_times_weighted_sum: Option<f64>,
}

impl ScoredContract {
    /// Binarized value of one indicator
    pub fn indicator(&self, indicator: Indicator) -> u8 {
        Indicator::ALL
            .iter()
            .position(|i| *i == indicator)
            .and_then(|idx| self.indicators.get(idx).copied())
            .unwrap_or(0)
    }
}

/// `ln(amount) * weighted_sum`; null when the amount is missing or not positive
pub fn log_weighted_score(amount: Option<f64>, weighted_sum: u32) -> Option<f64> {
    amount
        .filter(|a| *a > 0.0)
        .map(|a| a.ln() * weighted_sum as f64)
}

/// Score binarized indicators (in [`Indicator::ALL`] order)
pub fn score(
    contract: ContractKey,
    indicators: Vec<u8>,
    amount: Option<f64>,
    weights: &ResolvedWeights,
) -> ScoredContract {
    let sum_of_features = indicators.iter().map(|v| u32::from(*v)).sum();
    let weighted_sum_of_features = indicators
        .iter()
        .zip(weights.as_slice())
        .map(|(v, w)| u32::from(*v) * u32::from(*w))
        .sum();
    ScoredContract {
        contract,
        log_monto_times_weighted_sum: log_weighted_score(amount, weighted_sum_of_features),
        indicators,
        amount,
        sum_of_features,
        weighted_sum_of_features,
    }
}

/// Group the joined table by contract, sum every indicator (nulls as 0),
/// binarize and score
pub fn fold_and_score(
    joined: &JoinedTable,
    contracts: &BTreeSet<ContractKey>,
    weights: &ResolvedWeights,
) -> Result<Vec<ScoredContract>, ScoringError> {
    let indices = Indicator::ALL
        .iter()
        .map(|indicator| {
            joined
                .column_index(indicator.name())
                .ok_or_else(|| ScoringError::MissingIndicatorColumn(indicator.name().to_string()))
        })
        .collect::<Result<Vec<usize>, ScoringError>>()?;

    let mut sums: BTreeMap<&ContractKey, (Option<f64>, Vec<f64>)> = BTreeMap::new();
    for row in &joined.rows {
        let (amount, totals) = sums
            .entry(&row.population.contract)
            .or_insert_with(|| (None, vec![0.0; indices.len()]));
        if let Some(value) = row.population.amount {
            *amount = Some(amount.unwrap_or(0.0) + value);
        }
        for (total, idx) in totals.iter_mut().zip(&indices) {
            *total += row.values[*idx].unwrap_or(0.0);
        }
    }

    if sums.len() != contracts.len() {
        return Err(ScoringError::ShapeMismatch {
            stage: "fold",
            expected: contracts.len(),
            actual: sums.len(),
        });
    }

    Ok(sums
        .into_iter()
        .map(|(contract, (amount, totals))| {
            let indicators = totals.iter().map(|t| u8::from(*t > 0.0)).collect();
            score(contract.clone(), indicators, amount, weights)
        })
        .collect())
}
