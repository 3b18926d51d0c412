//! Consortium expansion
//!
//! Joint awards are recorded as one winner field naming every member:
//! `"ACME SA DE CV / BETA S DE RL (PROPUESTA CONJUNTA)"`. Features are
//! computed per company, so each joint award is expanded into one row per
//! member with the monetary amounts divided evenly between them.
//!
//! # Critical Invariants
//!
//! 1. **Amount conservation**: the expanded amounts of one award sum to the
//!    original amount (up to floating point rounding)
//! 2. **Coverage**: every input row yields at least one output row
//! 3. **Ordering**: output is stably sorted by (`event_id`, `publication_date`),
//!    pass-through rows ahead of expanded rows within ties

use crate::core::names::normalize_name;
use crate::models::contract::ContractRecord;
use crate::models::keys::SupplierKey;
use std::cmp::Ordering;

/// Separator between consortium members
pub const CONSORTIUM_SEPARATOR: char = '/';

/// Markers the capture teams appended to joint proposals
const JOINT_PROPOSAL_MARKERS: [&str; 4] = [
    "(PROPUESTA CONJUNTA)",
    "(PROPUESTA CONJUNTA",
    "(JOINT PROPOSAL)",
    "(JOINT PROPOSAL",
];

/// One contract-participant row
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRow {
    /// Source record; for consortium members `supplier_name` holds the member
    /// and the amounts hold the member's share
    pub record: ContractRecord,

    /// Normalized member name
    pub supplier_key: Option<SupplierKey>,

    /// Row was split out of a joint award
    pub consortium: bool,
}

/// Split a (possibly joint) company field into cleaned member names.
///
/// Markers are removed, names trimmed and empty parts dropped. The names are
/// not normalized; see [`split_participant_keys`]. Since empty parts are
/// dropped, amounts split over these names divide by the non-empty count:
/// `"A / "` yields one name, not the two raw parts.
pub fn split_participant_names(raw: &str) -> Vec<String> {
    raw.split(CONSORTIUM_SEPARATOR)
        .map(|part| {
            let mut cleaned = part.to_string();
            for marker in JOINT_PROPOSAL_MARKERS {
                cleaned = cleaned.replace(marker, "");
            }
            cleaned.trim().to_string()
        })
        .filter(|part| !part.is_empty())
        .collect()
}

/// Split a (possibly joint) company field into normalized supplier keys.
///
/// # Example
/// ```
/// use procurement_risk_core::entity::consortium::split_participant_keys;
/// use procurement_risk_core::models::SupplierKey;
///
/// let keys = split_participant_keys("ACME SA DE CV / BETA S DE RL (PROPUESTA CONJUNTA)");
/// assert_eq!(keys, vec![SupplierKey::new("ACME"), SupplierKey::new("BETA")]);
/// ```
pub fn split_participant_keys(raw: &str) -> Vec<SupplierKey> {
    split_participant_names(raw)
        .iter()
        .filter_map(|name| normalize_name(name))
        .map(SupplierKey)
        .collect()
}

/// Expand joint awards into one row per member.
///
/// Rows without a separator pass through with their normalized key.
/// Amounts divide by the number of non-empty member names.
pub fn expand_consortia(records: &[ContractRecord]) -> Vec<ExpandedRow> {
    let mut single = Vec::with_capacity(records.len());
    let mut expanded = Vec::new();

    for record in records {
        if !record.is_consortium() {
            single.push(pass_through(record));
            continue;
        }

        let raw = record.supplier_name.as_deref().unwrap_or_default();
        let members = split_participant_names(raw);
        if members.is_empty() {
            // Separator only ("/"): nothing to split
            single.push(ExpandedRow {
                record: record.clone(),
                supplier_key: None,
                consortium: false,
            });
            continue;
        }

        let n = members.len() as f64;
        for member in members {
            let mut row = record.clone();
            row.amount = record.amount.map(|a| a / n);
            row.amount_min = record.amount_min.map(|a| a / n);
            row.amount_max = record.amount_max.map(|a| a / n);
            let supplier_key = normalize_name(&member).map(SupplierKey);
            row.supplier_name = Some(member);
            expanded.push(ExpandedRow {
                record: row,
                supplier_key,
                consortium: true,
            });
        }
    }

    let mut rows = single;
    rows.append(&mut expanded);
    rows.sort_by(|a, b| {
        a.record
            .event_id
            .cmp(&b.record.event_id)
            .then_with(|| cmp_nulls_last(&a.record, &b.record))
    });
    rows
}

fn pass_through(record: &ContractRecord) -> ExpandedRow {
    ExpandedRow {
        record: record.clone(),
        supplier_key: record
            .supplier_name
            .as_deref()
            .and_then(normalize_name)
            .map(SupplierKey),
        consortium: false,
    }
}

fn cmp_nulls_last(a: &ContractRecord, b: &ContractRecord) -> Ordering {
    match (a.publication_date, b.publication_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
