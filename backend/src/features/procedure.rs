//! Procedure calculators
//!
//! Indicators about how a procedure was run: whether the secondary portal
//! knows it and agrees with the disclosure, how many quotations a direct
//! award collected, whether the clarification meeting had attendees, and how
//! many companies bid or were invited.
//!
//! Auxiliary tables are matched on the canonical event id (trimmed,
//! uppercase). Company fields are split and normalized like the winner
//! field of the disclosure.

use crate::entity::consortium::split_participant_keys;
use crate::features::{tabulate, FeatureContext};
use crate::models::contract::ProcedureType;
use crate::models::feature::{flag_value, FeatureTable};
use crate::models::keys::{ProcedureKey, SupplierKey};
use crate::models::tables::canonical_event_id;
use crate::scoring::indicator::Indicator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Parameters of the procedure calculators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcedureConfig {
    /// Relative difference of total maximum amounts tolerated between sources
    pub amount_tolerance: f64,

    /// Procedures with fewer distinct possible bidders are flagged
    pub low_participation_min: usize,
}

impl Default for ProcedureConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: 0.01,
            low_participation_min: 3,
        }
    }
}

// ============================================================================
// Procedure summaries
// ============================================================================

/// One procedure as seen by a single source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcedureSummary {
    pub procedure_type: ProcedureType,
    pub winners: BTreeSet<SupplierKey>,
    pub contract_numbers: BTreeSet<String>,
    pub total_amount_max: Option<f64>,
    pub publication_date: Option<NaiveDate>,
    pub has_meeting_date: bool,
}

fn add_amount(total: &mut Option<f64>, amount: Option<f64>) {
    if let Some(amount) = amount {
        *total = Some(total.unwrap_or(0.0) + amount);
    }
}

/// Disclosure-side summary of every procedure in the base table
pub fn disclosure_summaries(ctx: &FeatureContext<'_>) -> BTreeMap<ProcedureKey, ProcedureSummary> {
    let mut summaries: BTreeMap<ProcedureKey, ProcedureSummary> = BTreeMap::new();
    for row in ctx.base.rows() {
        let summary = summaries
            .entry(row.procedure_key())
            .or_insert_with(|| ProcedureSummary {
                procedure_type: row.procedure_type(),
                ..Default::default()
            });
        if let Some(key) = &row.supplier_key {
            summary.winners.insert(key.clone());
        }
        summary
            .contract_numbers
            .insert(row.record.contract_number.clone());
        // Consortium rows carry divided amounts, so the sum is the original total
        add_amount(&mut summary.total_amount_max, row.record.amount_max);
        if summary.publication_date.is_none() {
            summary.publication_date = row.record.publication_date;
        }
        summary.has_meeting_date |= row.record.clarification_meeting_date.is_some();
    }
    summaries
}

/// Secondary-portal summary keyed by canonical event id
pub fn secondary_summaries(ctx: &FeatureContext<'_>) -> BTreeMap<String, ProcedureSummary> {
    let mut summaries: BTreeMap<String, ProcedureSummary> = BTreeMap::new();
    for record in ctx.secondary {
        let summary = summaries
            .entry(canonical_event_id(&record.event_id))
            .or_default();
        if let Some(name) = &record.supplier_name {
            summary.winners.extend(split_participant_keys(name));
        }
        add_amount(&mut summary.total_amount_max, record.amount_max);
        if summary.publication_date.is_none() {
            summary.publication_date = record.publication_date;
        }
    }
    summaries
}

/// Fields on which the two sources disagree
///
/// Only fields present on both sides are compared.
pub fn discrepancies(
    disclosed: &ProcedureSummary,
    secondary: &ProcedureSummary,
    amount_tolerance: f64,
) -> Vec<&'static str> {
    let mut fields = Vec::new();

    if !disclosed.winners.is_empty()
        && !secondary.winners.is_empty()
        && disclosed.winners != secondary.winners
    {
        fields.push("winners");
    }

    if let (Some(a), Some(b)) = (disclosed.total_amount_max, secondary.total_amount_max) {
        let scale = a.abs().max(b.abs());
        if scale > 0.0 && (a - b).abs() / scale > amount_tolerance {
            fields.push("amount_max");
        }
    }

    if let (Some(a), Some(b)) = (disclosed.publication_date, secondary.publication_date) {
        if a != b {
            fields.push("publication_date");
        }
    }

    fields
}

// ============================================================================
// Calculators
// ============================================================================

/// No secondary-portal record with the same event id
pub fn missing_from_secondary_source(ctx: &FeatureContext<'_>) -> FeatureTable<ProcedureKey> {
    let known: BTreeSet<String> = ctx
        .secondary
        .iter()
        .map(|r| canonical_event_id(&r.event_id))
        .collect();

    let name = Indicator::MissingFromSecondarySource.name();
    tabulate(name, &[name], &ctx.populations.procedures, |key| {
        let present = known.contains(&canonical_event_id(key.as_str()));
        vec![flag_value(Some(!present))]
    })
}

/// Matched procedures whose winner, total amount or publication date
/// disagree between sources; null for unmatched procedures
pub fn cross_source_discrepancy(ctx: &FeatureContext<'_>) -> FeatureTable<ProcedureKey> {
    let tolerance = ctx.config.procedure.amount_tolerance;
    let disclosed = disclosure_summaries(ctx);
    let secondary = secondary_summaries(ctx);

    let name = Indicator::CrossSourceDiscrepancy.name();
    tabulate(
        name,
        &[name, "discrepant_fields"],
        &ctx.populations.procedures,
        |key| {
            let matched = disclosed
                .get(key)
                .zip(secondary.get(&canonical_event_id(key.as_str())));
            match matched {
                Some((d, s)) => {
                    let fields = discrepancies(d, s, tolerance);
                    if !fields.is_empty() {
                        tracing::trace!(procedure = %key, ?fields, "sources disagree");
                    }
                    vec![flag_value(Some(!fields.is_empty())), Some(fields.len() as f64)]
                }
                None => vec![None, None],
            }
        },
    )
}

/// Direct award backed by at most one quotation
pub fn single_quotation_award(ctx: &FeatureContext<'_>) -> FeatureTable<ProcedureKey> {
    let mut quotations: BTreeMap<String, u32> = BTreeMap::new();
    for record in ctx.quotations {
        *quotations
            .entry(canonical_event_id(&record.event_id))
            .or_default() += record.quotations;
    }
    let disclosed = disclosure_summaries(ctx);

    let name = Indicator::SingleQuotationAward.name();
    tabulate(name, &[name, "quotations"], &ctx.populations.procedures, |key| {
        let count = quotations.get(&canonical_event_id(key.as_str())).copied();
        let direct_award = disclosed
            .get(key)
            .map_or(false, |s| s.procedure_type.is_direct_award());
        let flag = if direct_award {
            count.map(|c| c <= 1)
        } else {
            Some(false)
        };
        vec![flag_value(flag), count.map(f64::from)]
    })
}

/// Competitive procedure with a clarification meeting but no attendance list
pub fn missing_meeting_attendance(ctx: &FeatureContext<'_>) -> FeatureTable<ProcedureKey> {
    let attended: BTreeSet<String> = ctx
        .attendance
        .iter()
        .map(|r| canonical_event_id(&r.event_id))
        .collect();
    let disclosed = disclosure_summaries(ctx);

    let name = Indicator::MissingMeetingAttendance.name();
    tabulate(name, &[name], &ctx.populations.procedures, |key| {
        let flag = disclosed.get(key).map(|s| {
            s.procedure_type.is_competitive()
                && s.has_meeting_date
                && !attended.contains(&canonical_event_id(key.as_str()))
        });
        vec![flag_value(flag)]
    })
}

/// Only one distinct company bid across the procedure's contracts
pub fn single_bid(ctx: &FeatureContext<'_>) -> FeatureTable<ProcedureKey> {
    let disclosed = disclosure_summaries(ctx);

    let name = Indicator::SingleBid.name();
    tabulate(name, &[name, "distinct_bidders"], &ctx.populations.procedures, |key| {
        let Some(summary) = disclosed.get(key) else {
            return vec![None, None];
        };
        if summary.procedure_type.is_direct_award() {
            return vec![flag_value(Some(false)), None];
        }

        let mut bidders: Option<BTreeSet<&SupplierKey>> = None;
        for contract_number in &summary.contract_numbers {
            if let Some(participants) = ctx.roster.participants(contract_number) {
                bidders.get_or_insert_with(BTreeSet::new).extend(participants);
            }
        }
        match bidders {
            Some(bidders) => vec![
                flag_value(Some(bidders.len() == 1)),
                Some(bidders.len() as f64),
            ],
            None => vec![None, None],
        }
    })
}

/// Fewer distinct possible bidders than the configured minimum
pub fn low_participation(ctx: &FeatureContext<'_>) -> FeatureTable<ProcedureKey> {
    let minimum = ctx.config.procedure.low_participation_min;
    let mut invited: BTreeMap<String, BTreeSet<SupplierKey>> = BTreeMap::new();
    for record in ctx.possible_bidders {
        invited
            .entry(canonical_event_id(&record.event_id))
            .or_default()
            .extend(split_participant_keys(&record.company));
    }
    let disclosed = disclosure_summaries(ctx);

    let name = Indicator::LowParticipation.name();
    tabulate(name, &[name, "possible_bidders"], &ctx.populations.procedures, |key| {
        let Some(summary) = disclosed.get(key) else {
            return vec![None, None];
        };
        if summary.procedure_type.is_direct_award() {
            return vec![flag_value(Some(false)), None];
        }
        match invited.get(&canonical_event_id(key.as_str())) {
            Some(companies) => vec![
                flag_value(Some(companies.len() < minimum)),
                Some(companies.len() as f64),
            ],
            None => vec![None, None],
        }
    })
}
