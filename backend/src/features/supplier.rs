//! Supplier cross-reference calculators
//!
//! Each calculator looks at every base row of a supplier and ORs a per-row
//! test across them. Reference lists are matched on the normalized name and
//! on the tax ID; a missing tax ID never matches a list.

use crate::core::dates::epoch_days;
use crate::features::roster::competitive_wins;
use crate::features::{tabulate, FeatureContext};
use crate::models::contract::BaseRow;
use crate::models::feature::{flag_value, FeatureTable};
use crate::models::keys::{ContractKey, SupplierKey};
use crate::models::reference::ReferenceList;
use crate::scoring::indicator::Indicator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Parameters of the supplier calculators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierConfig {
    /// Companies incorporated on or after this date are "recent"
    pub recent_incorporation_cutoff: NaiveDate,

    /// Roster appearances needed before a success rate is defined
    pub success_min_appearances: usize,

    /// Success rates strictly above this are flagged
    pub success_rate_threshold: f64,
}

impl Default for SupplierConfig {
    fn default() -> Self {
        Self {
            recent_incorporation_cutoff: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default(),
            success_min_appearances: 3,
            success_rate_threshold: 0.5,
        }
    }
}

/// Base rows grouped by supplier
fn rows_by_supplier<'a>(ctx: &FeatureContext<'a>) -> BTreeMap<&'a SupplierKey, Vec<&'a BaseRow>> {
    let mut grouped: BTreeMap<&SupplierKey, Vec<&BaseRow>> = BTreeMap::new();
    for (key, row) in ctx.base.supplier_rows() {
        grouped.entry(key).or_default().push(row);
    }
    grouped
}

/// One-column table: does any row of the supplier satisfy `test`?
fn any_row_table<F>(
    ctx: &FeatureContext<'_>,
    indicator: Indicator,
    test: F,
) -> FeatureTable<SupplierKey>
where
    F: Fn(&SupplierKey, &BaseRow) -> bool,
{
    let grouped = rows_by_supplier(ctx);
    let name = indicator.name();
    tabulate(name, &[name], &ctx.populations.suppliers, |key| {
        let flag = grouped
            .get(key)
            .map(|rows| rows.iter().any(|row| test(key, row)));
        vec![flag_value(flag)]
    })
}

fn listed(list: &ReferenceList, key: &SupplierKey, row: &BaseRow) -> bool {
    list.contains_name(key) || list.contains_tax_id(row.tax_id.as_deref())
}

/// Name or tax ID of some row is missing from the supplier registry
pub fn not_in_supplier_registry(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    let registry = &ctx.references.registered_suppliers;
    any_row_table(ctx, Indicator::NotInSupplierRegistry, |key, row| {
        !registry.contains_name(key) || !registry.contains_tax_id(row.tax_id.as_deref())
    })
}

/// Listed as definitive or presumed ghost company
pub fn reported_ghost_company(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    any_row_table(ctx, Indicator::ReportedGhostCompany, |key, row| {
        listed(&ctx.references.ghost_companies, key, row)
    })
}

/// Listed as not located by the tax authority
pub fn not_located_by_tax_authority(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    any_row_table(ctx, Indicator::NotLocatedByTaxAuthority, |key, row| {
        listed(&ctx.references.not_located, key, row)
    })
}

/// Sanctioned as a supplier or as an individual, by name or tax ID
pub fn sanctioned(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    any_row_table(ctx, Indicator::Sanctioned, |key, row| {
        listed(&ctx.references.sanctioned_suppliers, key, row)
            || listed(&ctx.references.sanctioned_individuals, key, row)
    })
}

/// Incorporation date of the supplier's dominant tax ID
///
/// Among the supplier's tax IDs with a derivable date, the one used on the
/// most distinct contracts wins; ties go to the smallest tax ID.
pub fn dominant_incorporation_date(rows: &[&BaseRow]) -> Option<NaiveDate> {
    let mut usage: BTreeMap<&str, (NaiveDate, BTreeSet<ContractKey>)> = BTreeMap::new();
    for row in rows {
        if let (Some(tax_id), Some(date)) = (row.tax_id.as_deref(), row.incorporation_date) {
            usage
                .entry(tax_id)
                .or_insert_with(|| (date, BTreeSet::new()))
                .1
                .insert(row.contract_key());
        }
    }

    // BTreeMap order makes the first maximum the smallest tax ID
    let mut best: Option<(usize, NaiveDate)> = None;
    for (date, contracts) in usage.values() {
        if best.map_or(true, |(count, _)| contracts.len() > count) {
            best = Some((contracts.len(), *date));
        }
    }
    best.map(|(_, date)| date)
}

/// Incorporated on or after the configured cutoff
pub fn recently_incorporated(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    let cutoff = ctx.config.supplier.recent_incorporation_cutoff;
    let grouped = rows_by_supplier(ctx);
    let name = Indicator::RecentlyIncorporated.name();

    tabulate(
        name,
        &[name, "incorporation_date_ordinal"],
        &ctx.populations.suppliers,
        |key| {
            let date = grouped
                .get(key)
                .and_then(|rows| dominant_incorporation_date(rows));
            vec![
                flag_value(date.map(|d| d >= cutoff)),
                date.map(|d| epoch_days(d) as f64),
            ]
        },
    )
}

/// Wins over roster appearances above the configured rate
///
/// Defined only for suppliers with at least one competitive win, enough
/// roster appearances and a consistent count (wins cannot exceed
/// appearances).
pub fn high_success_rate(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    let config = &ctx.config.supplier;
    let wins = competitive_wins(ctx.base);
    let name = Indicator::HighSuccessRate.name();

    tabulate(name, &[name, "success_rate"], &ctx.populations.suppliers, |key| {
        let appearances = ctx.roster.appearances(key);
        let Some(won) = wins.get(key).map(|w| w.len()) else {
            return vec![None, None];
        };
        if appearances < config.success_min_appearances.max(1) || won > appearances {
            return vec![None, None];
        }
        let rate = won as f64 / appearances as f64;
        vec![
            flag_value(Some(rate > config.success_rate_threshold)),
            Some(rate),
        ]
    })
}
