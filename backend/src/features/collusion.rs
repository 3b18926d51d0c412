//! Joint-bidding collusion
//!
//! A winner that keeps showing up on bid rosters next to the same
//! co-bidder, and wins most of those procedures, suggests the co-bidder is
//! a cover bid.
//!
//! For every supplier with at least one competitive win and at least
//! `min_appearances` roster appearances:
//!
//! ```text
//! ratio(co)  = joint appearances with co / own appearances
//! win_rate   = competitive wins / own appearances
//! flag       = max ratio >= co_bid_ratio  AND  win_rate >= win_rate_threshold
//! ```
//!
//! Every other supplier of the population is `0`; this indicator is never
//! null.

use crate::features::roster::competitive_wins;
use crate::features::{tabulate, FeatureContext};
use crate::models::feature::{flag_value, FeatureTable};
use crate::models::keys::SupplierKey;
use crate::scoring::indicator::Indicator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollusionConfig {
    /// Roster appearances a winner needs before it is examined
    pub min_appearances: usize,

    /// Joint-appearance ratio that makes a co-bidder suspicious
    pub co_bid_ratio: f64,

    /// Win rate the winner must reach
    pub win_rate: f64,
}

impl Default for CollusionConfig {
    fn default() -> Self {
        Self {
            min_appearances: 5,
            co_bid_ratio: 0.5,
            win_rate: 0.5,
        }
    }
}

/// Evidence gathered for one examined winner
#[derive(Debug, Clone, PartialEq)]
pub struct CollusionEvidence {
    pub appearances: usize,
    pub wins: usize,
    /// Co-bidder with the highest joint-appearance ratio (smallest key on ties)
    pub top_co_bidder: Option<SupplierKey>,
    pub max_co_bid_ratio: f64,
}

impl CollusionEvidence {
    pub fn win_rate(&self) -> f64 {
        self.wins as f64 / self.appearances as f64
    }

    pub fn is_suspicious(&self, config: &CollusionConfig) -> bool {
        self.max_co_bid_ratio >= config.co_bid_ratio && self.win_rate() >= config.win_rate
    }
}

/// Evidence for every winner with enough roster appearances
pub fn collusion_evidence(ctx: &FeatureContext<'_>) -> BTreeMap<SupplierKey, CollusionEvidence> {
    let config = &ctx.config.collusion;
    let wins = competitive_wins(ctx.base);
    let mut evidence = BTreeMap::new();

    for (winner, won) in &wins {
        let Some(contracts) = ctx.roster.contracts_of(winner) else {
            continue;
        };
        if contracts.len() < config.min_appearances.max(1) {
            continue;
        }

        let mut joint: BTreeMap<&SupplierKey, usize> = BTreeMap::new();
        for contract_number in contracts {
            if let Some(participants) = ctx.roster.participants(contract_number) {
                for co in participants.iter().filter(|co| *co != winner) {
                    *joint.entry(co).or_default() += 1;
                }
            }
        }

        let appearances = contracts.len();
        let mut top: Option<(&SupplierKey, usize)> = None;
        for (co, count) in &joint {
            if top.map_or(true, |(_, best)| *count > best) {
                top = Some((*co, *count));
            }
        }

        evidence.insert(
            winner.clone(),
            CollusionEvidence {
                appearances,
                wins: won.len(),
                top_co_bidder: top.map(|(co, _)| co.clone()),
                max_co_bid_ratio: top.map_or(0.0, |(_, c)| c as f64 / appearances as f64),
            },
        );
    }
    evidence
}

/// Winner repeatedly co-bids with the same company and wins most of the time
pub fn joint_bidding_collusion(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    let config = &ctx.config.collusion;
    let evidence = collusion_evidence(ctx);

    let flagged = evidence.values().filter(|e| e.is_suspicious(config)).count();
    tracing::debug!(examined = evidence.len(), flagged, "joint bidding collusion");

    let name = Indicator::JointBiddingCollusion.name();
    tabulate(name, &[name, "max_co_bid_ratio"], &ctx.populations.suppliers, |key| {
        match evidence.get(key) {
            Some(e) => vec![
                flag_value(Some(e.is_suspicious(config))),
                Some(e.max_co_bid_ratio),
            ],
            None => vec![flag_value(Some(false)), None],
        }
    })
}
