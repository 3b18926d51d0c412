//! Audit features
//!
//! Continuous columns that do not enter the score but help an analyst read
//! a flagged contract: how many direct awards a supplier collected, how old
//! the company was at its first award, its share of each subject type, how
//! long the procedure stages took, and whether a procedure was won by a
//! listed company.

use crate::core::dates::{days_between, min_days};
use crate::features::{tabulate, FeatureContext};
use crate::models::feature::{flag_value, FeatureTable};
use crate::models::keys::{ContractKey, ProcedureKey, SupplierKey};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct SupplierAudit {
    direct_awards: BTreeSet<ContractKey>,
    direct_award_amount: f64,
    /// Earliest award date per incorporation date
    first_award: BTreeMap<NaiveDate, NaiveDate>,
}

/// Direct-award counts and company age at first award
///
/// Direct awards only count contracts with a positive amount.
pub fn supplier_audit(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    let mut audits: BTreeMap<&SupplierKey, SupplierAudit> = BTreeMap::new();
    for (key, row) in ctx.base.supplier_rows() {
        let audit = audits.entry(key).or_default();
        if row.procedure_type().is_direct_award() {
            if let Some(amount) = row.record.amount.filter(|a| *a > 0.0) {
                audit.direct_awards.insert(row.contract_key());
                audit.direct_award_amount += amount;
            }
        }
        if let (Some(incorporated), Some(awarded)) = (row.incorporation_date, row.record.award_date) {
            let first = audit.first_award.entry(incorporated).or_insert(awarded);
            *first = (*first).min(awarded);
        }
    }

    tabulate(
        "supplier_audit",
        &[
            "direct_awards",
            "direct_award_amount",
            "days_incorporation_to_first_award",
        ],
        &ctx.populations.suppliers,
        |key| match audits.get(key) {
            Some(audit) => {
                let days = audit
                    .first_award
                    .iter()
                    .filter_map(|(inc, award)| days_between(Some(*inc), Some(*award)))
                    .min();
                vec![
                    Some(audit.direct_awards.len() as f64),
                    Some(audit.direct_award_amount),
                    days.map(|d| d as f64),
                ]
            }
            None => vec![None, None, None],
        },
    )
}

/// Subject categories with a share column, in column order
pub const SUBJECT_SHARE_COLUMNS: [(&str, &str); 3] = [
    ("Goods", "pct_amount_goods"),
    ("Services", "pct_amount_services"),
    ("Public Works", "pct_amount_public_works"),
];

/// Percent of each subject type's positive maximum amount won by the
/// supplier, across all awarding entities
///
/// A supplier with no positive maximum amount in any of these types is null;
/// otherwise a type it never won is 0.
pub fn supplier_subject_shares(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    let mut totals = [0.0_f64; SUBJECT_SHARE_COLUMNS.len()];
    let mut won: BTreeMap<&SupplierKey, [f64; SUBJECT_SHARE_COLUMNS.len()]> = BTreeMap::new();
    for (key, row) in ctx.base.supplier_rows() {
        let Some(amount) = row.record.amount_max.filter(|a| *a > 0.0) else {
            continue;
        };
        let Some(slot) = SUBJECT_SHARE_COLUMNS
            .iter()
            .position(|(category, _)| *category == row.subject_category)
        else {
            continue;
        };
        totals[slot] += amount;
        won.entry(key).or_default()[slot] += amount;
    }

    let columns: Vec<&str> = SUBJECT_SHARE_COLUMNS.iter().map(|(_, c)| *c).collect();
    tabulate("subject_shares", &columns, &ctx.populations.suppliers, |key| {
        match won.get(key) {
            Some(amounts) => amounts
                .iter()
                .zip(totals)
                .map(|(amount, total)| {
                    let share = if total > 0.0 { amount / total } else { 0.0 };
                    Some(100.0 * share)
                })
                .collect(),
            None => vec![None; SUBJECT_SHARE_COLUMNS.len()],
        }
    })
}

/// Procedures won by a ghost company or a sanctioned supplier
///
/// A ghost winner matches the registry by name or tax ID; a sanctioned
/// winner matches the sanctions list by name.
pub fn procedure_listed_winners(ctx: &FeatureContext<'_>) -> FeatureTable<ProcedureKey> {
    let references = ctx.references;
    let mut listed: BTreeMap<ProcedureKey, (bool, bool)> = BTreeMap::new();
    for row in ctx.base.rows() {
        let entry = listed.entry(row.procedure_key()).or_default();
        let Some(key) = &row.supplier_key else {
            continue;
        };
        entry.0 |= references.ghost_companies.contains_name(key)
            || references.ghost_companies.contains_tax_id(row.tax_id.as_deref());
        entry.1 |= references.sanctioned_suppliers.contains_name(key);
    }

    tabulate(
        "listed_winners",
        &["with_ghost_winner", "with_sanctioned_winner"],
        &ctx.populations.procedures,
        |key| {
            let (ghost, sanctioned) = listed.get(key).copied().unwrap_or_default();
            vec![flag_value(Some(ghost)), flag_value(Some(sanctioned))]
        },
    )
}

/// Stage durations of competitive procedures
///
/// Direct awards have no publication or proposal stage; their durations are
/// null.
pub fn procedure_audit(ctx: &FeatureContext<'_>) -> FeatureTable<ProcedureKey> {
    let mut stages: BTreeMap<ProcedureKey, (Option<i64>, Option<i64>)> = BTreeMap::new();
    for row in ctx.base.rows() {
        let entry = stages.entry(row.procedure_key()).or_insert((None, None));
        if !row.procedure_type().is_competitive() {
            continue;
        }
        let record = &row.record;
        let to_proposals = days_between(record.publication_date, record.proposal_receipt_date);
        let to_award = days_between(record.proposal_receipt_date, record.award_date);
        entry.0 = min_days(entry.0, to_proposals);
        entry.1 = min_days(entry.1, to_award);
    }

    tabulate(
        "procedure_audit",
        &["days_publication_to_proposals", "days_proposals_to_award"],
        &ctx.populations.procedures,
        |key| {
            let (to_proposals, to_award) = stages.get(key).copied().unwrap_or((None, None));
            vec![to_proposals.map(|d| d as f64), to_award.map(|d| d as f64)]
        },
    )
}
