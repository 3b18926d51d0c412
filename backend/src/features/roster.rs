//! Bid roster index
//!
//! The bid table lists, per contract number, every company that submitted
//! a bid. Joint bids name several companies in one field; the roster splits
//! them, normalizes each member and deduplicates per contract.

use crate::entity::base::BaseTable;
use crate::entity::consortium::split_participant_keys;
use crate::models::keys::SupplierKey;
use crate::models::tables::BidRecord;
use std::collections::{BTreeMap, BTreeSet};

/// Normalized bidders per contract number
///
/// # Example
/// ```
/// use procurement_risk_core::features::BidRoster;
/// use procurement_risk_core::models::{BidRecord, SupplierKey};
///
/// let roster = BidRoster::build(&[
///     BidRecord::new("C-1", "ACME SA DE CV"),
///     BidRecord::new("C-1", "Acme, S.A. de C.V."),
///     BidRecord::new("C-1", "BETA SC / GAMMA INC"),
/// ]);
///
/// assert_eq!(roster.participants("C-1").map(|p| p.len()), Some(3));
/// assert_eq!(roster.appearances(&SupplierKey::new("ACME")), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BidRoster {
    by_contract: BTreeMap<String, BTreeSet<SupplierKey>>,
    by_supplier: BTreeMap<SupplierKey, BTreeSet<String>>,
}

impl BidRoster {
    pub fn build(bids: &[BidRecord]) -> Self {
        let mut roster = Self::default();
        for bid in bids {
            let participants = roster
                .by_contract
                .entry(bid.contract_number.clone())
                .or_default();
            for key in split_participant_keys(&bid.bidder) {
                roster
                    .by_supplier
                    .entry(key.clone())
                    .or_default()
                    .insert(bid.contract_number.clone());
                participants.insert(key);
            }
        }
        roster
    }

    /// Distinct bidders of a contract; `None` if it has no roster entry
    pub fn participants(&self, contract_number: &str) -> Option<&BTreeSet<SupplierKey>> {
        self.by_contract.get(contract_number)
    }

    /// Every contract with its bidders, in contract-number order
    pub fn contracts(&self) -> impl Iterator<Item = (&str, &BTreeSet<SupplierKey>)> {
        self.by_contract.iter().map(|(c, p)| (c.as_str(), p))
    }

    /// Contract numbers whose roster includes `supplier`
    pub fn contracts_of(&self, supplier: &SupplierKey) -> Option<&BTreeSet<String>> {
        self.by_supplier.get(supplier)
    }

    /// Number of contracts whose roster includes `supplier`
    pub fn appearances(&self, supplier: &SupplierKey) -> usize {
        self.by_supplier.get(supplier).map_or(0, |c| c.len())
    }

    pub fn num_contracts(&self) -> usize {
        self.by_contract.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_contract.is_empty()
    }
}

/// Contract numbers each supplier won outside direct awards
pub fn competitive_wins(base: &BaseTable) -> BTreeMap<SupplierKey, BTreeSet<String>> {
    let mut wins: BTreeMap<SupplierKey, BTreeSet<String>> = BTreeMap::new();
    for (key, row) in base.supplier_rows() {
        if !row.procedure_type().is_direct_award() {
            wins.entry(key.clone())
                .or_default()
                .insert(row.record.contract_number.clone());
        }
    }
    wins
}
