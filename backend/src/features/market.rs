//! Market-concentration calculators
//!
//! A segment is an (awarding entity × subject category) pair. Within every
//! segment with enough contracts, each supplier's share of the segment is
//! computed by amount and by distinct-contract count. A supplier is flagged
//! when its share is above the segment's upper quantile (default 0.9).
//!
//! Supplier flag semantics:
//! - `1` if flagged in any eligible segment
//! - `0` if it takes part in an eligible segment without exceeding
//! - null if it takes part in no eligible segment
//!
//! The per-segment shares are emitted as continuous columns
//! (`share_by_amount_<entity>_<subject>`), 0 for suppliers absent from a
//! segment.

use crate::features::{tabulate, FeatureContext};
use crate::models::feature::{flag_value, FeatureTable};
use crate::models::keys::{ContractKey, SupplierKey};
use crate::scoring::indicator::Indicator;
use crate::stats::{SegmentedThreshold, ThresholdDirection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Parameters of the market-share calculators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketShareConfig {
    /// Shares strictly above this quantile of the segment are flagged
    pub quantile: f64,

    /// Distinct contracts a segment needs to be considered
    pub min_segment_contracts: usize,
}

impl Default for MarketShareConfig {
    fn default() -> Self {
        Self {
            quantile: 0.9,
            min_segment_contracts: 6,
        }
    }
}

/// (awarding entity, subject category)
pub type Segment = (String, String);

/// How a share is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareBasis {
    Amount,
    Count,
}

impl ShareBasis {
    fn column_prefix(&self) -> &'static str {
        match self {
            ShareBasis::Amount => "share_by_amount",
            ShareBasis::Count => "share_by_count",
        }
    }

    fn indicator(&self) -> Indicator {
        match self {
            ShareBasis::Amount => Indicator::RiskyMarketShareByAmount,
            ShareBasis::Count => Indicator::RiskyMarketShareByCount,
        }
    }
}

#[derive(Debug, Default)]
struct SegmentTotals {
    contracts: BTreeSet<ContractKey>,
    amount: f64,
    supplier_contracts: BTreeMap<SupplierKey, BTreeSet<ContractKey>>,
    supplier_amount: BTreeMap<SupplierKey, f64>,
}

/// Shares of every supplier in every eligible segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentShares {
    pub shares: BTreeMap<Segment, BTreeMap<SupplierKey, f64>>,
}

impl SegmentShares {
    pub fn compute(ctx: &FeatureContext<'_>, basis: ShareBasis) -> Self {
        let min_contracts = ctx.config.market.min_segment_contracts;

        let mut segments: BTreeMap<Segment, SegmentTotals> = BTreeMap::new();
        for row in ctx.base.rows() {
            let segment = (
                row.record.awarding_entity.trim().to_string(),
                row.subject_category.clone(),
            );
            let totals = segments.entry(segment).or_default();
            let amount = row.record.amount.unwrap_or(0.0);
            totals.contracts.insert(row.contract_key());
            totals.amount += amount;
            if let Some(key) = &row.supplier_key {
                totals
                    .supplier_contracts
                    .entry(key.clone())
                    .or_default()
                    .insert(row.contract_key());
                *totals.supplier_amount.entry(key.clone()).or_default() += amount;
            }
        }

        let mut shares = BTreeMap::new();
        for (segment, totals) in segments {
            if totals.contracts.len() < min_contracts {
                continue;
            }
            let segment_shares: BTreeMap<SupplierKey, f64> = match basis {
                ShareBasis::Count => {
                    let total = totals.contracts.len() as f64;
                    totals
                        .supplier_contracts
                        .into_iter()
                        .map(|(k, c)| (k, c.len() as f64 / total))
                        .collect()
                }
                ShareBasis::Amount => {
                    if totals.amount <= 0.0 {
                        tracing::debug!(
                            entity = %segment.0,
                            subject = %segment.1,
                            "segment has no positive amount; amount shares undefined"
                        );
                        continue;
                    }
                    totals
                        .supplier_amount
                        .into_iter()
                        .map(|(k, a)| (k, a / totals.amount))
                        .collect()
                }
            };
            shares.insert(segment, segment_shares);
        }
        Self { shares }
    }

    /// Supplier flags per segment against the segment's upper quantile
    pub fn flags(&self, q: f64) -> BTreeMap<SupplierKey, Option<bool>> {
        let thresholds = SegmentedThreshold::fit(
            self.shares.iter().flat_map(|(segment, suppliers)| {
                suppliers
                    .values()
                    .map(move |share| (segment.clone(), Some(*share)))
            }),
            q,
            1,
        );

        let mut flags: BTreeMap<SupplierKey, Option<bool>> = BTreeMap::new();
        for (segment, suppliers) in &self.shares {
            for (supplier, share) in suppliers {
                let flag = thresholds.flag(segment, Some(*share), ThresholdDirection::Above);
                let entry = flags.entry(supplier.clone()).or_insert(None);
                *entry = match (*entry, flag) {
                    (Some(true), _) | (_, Some(true)) => Some(true),
                    (Some(false), _) | (_, Some(false)) => Some(false),
                    _ => None,
                };
            }
        }
        flags
    }
}

/// Column-safe slug of a segment: lowercase, spaces replaced by `_`
pub fn segment_slug(segment: &Segment) -> String {
    format!("{}_{}", segment.0, segment.1)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn market_share_table(ctx: &FeatureContext<'_>, basis: ShareBasis) -> FeatureTable<SupplierKey> {
    let indicator = basis.indicator();
    let shares = SegmentShares::compute(ctx, basis);
    let flags = shares.flags(ctx.config.market.quantile);

    let mut columns = vec![indicator.name().to_string()];
    let mut used: BTreeSet<String> = BTreeSet::new();
    for segment in shares.shares.keys() {
        let base = format!("{}_{}", basis.column_prefix(), segment_slug(segment));
        let mut column = base.clone();
        let mut suffix = 2;
        while !used.insert(column.clone()) {
            column = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        columns.push(column);
    }
    let column_refs: Vec<&str> = columns.iter().map(String::as_str).collect();

    tabulate(
        indicator.name(),
        &column_refs,
        &ctx.populations.suppliers,
        |key| {
            let mut row = vec![flag_value(flags.get(key).copied().flatten())];
            row.extend(
                shares
                    .shares
                    .values()
                    .map(|suppliers| Some(suppliers.get(key).copied().unwrap_or(0.0))),
            );
            row
        },
    )
}

/// Supplier dominates some segment by number of contracts
pub fn risky_market_share_by_count(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    market_share_table(ctx, ShareBasis::Count)
}

/// Supplier dominates some segment by contracted amount
pub fn risky_market_share_by_amount(ctx: &FeatureContext<'_>) -> FeatureTable<SupplierKey> {
    market_share_table(ctx, ShareBasis::Amount)
}
