//! Feature calculators
//!
//! Every calculator is a pure function of a [`FeatureContext`] that returns a
//! [`FeatureTable`] keyed by one grain. Calculators are registered per grain
//! in [`supplier_calculators`], [`procedure_calculators`] and
//! [`contract_calculators`]; [`compute_grain`] runs a registry and
//! concatenates the results column-wise.
//!
//! # Critical Invariants
//!
//! 1. **Population coverage**: a calculator emits exactly one row per key of
//!    its grain's population, built with [`tabulate`]. Missing evidence is a
//!    `None` cell.
//! 2. **Indicator ownership**: each [`Indicator`] is emitted by exactly one
//!    registered calculator of the indicator's grain, in a column named
//!    after it.
//! 3. **No I/O**: calculators only read the context.

pub mod audit;
pub mod collusion;
pub mod contract;
pub mod market;
pub mod procedure;
pub mod roster;
pub mod supplier;

use crate::entity::base::{BaseTable, Populations};
use crate::models::feature::{FeatureTable, FeatureTableError};
use crate::models::keys::{ContractKey, GrainKey, ProcedureKey, SupplierKey};
use crate::models::reference::ReferenceIndex;
use crate::models::tables::{
    AttendanceRecord, BidRecord, PossibleBidderRecord, QuotationRecord, SecondaryRecord,
};
use crate::scoring::indicator::Indicator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use collusion::CollusionConfig;
pub use contract::IntervalConfig;
pub use market::MarketShareConfig;
pub use procedure::ProcedureConfig;
pub use roster::BidRoster;
pub use supplier::SupplierConfig;

// ============================================================================
// Configuration
// ============================================================================

/// Parameters of every calculator
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub intervals: IntervalConfig,
    pub supplier: SupplierConfig,
    pub procedure: ProcedureConfig,
    pub market: MarketShareConfig,
    pub collusion: CollusionConfig,
}

// ============================================================================
// Context
// ============================================================================

/// Everything a calculator may read
///
/// Built once per run; calculators borrow it immutably.
#[derive(Debug)]
pub struct FeatureContext<'a> {
    pub base: &'a BaseTable,
    pub populations: &'a Populations,
    pub roster: &'a BidRoster,
    pub quotations: &'a [QuotationRecord],
    pub attendance: &'a [AttendanceRecord],
    pub possible_bidders: &'a [PossibleBidderRecord],
    pub secondary: &'a [SecondaryRecord],
    pub references: &'a ReferenceIndex,
    pub config: &'a FeatureConfig,
}

/// Auxiliary tables handed to [`FeatureContext`] construction
#[derive(Debug, Clone, Copy, Default)]
pub struct AuxiliaryTables<'a> {
    pub bids: &'a [BidRecord],
    pub quotations: &'a [QuotationRecord],
    pub attendance: &'a [AttendanceRecord],
    pub possible_bidders: &'a [PossibleBidderRecord],
    pub secondary: &'a [SecondaryRecord],
}

// ============================================================================
// Registry
// ============================================================================

/// A registered feature calculator of grain `K`
pub struct Calculator<K: GrainKey> {
    /// Table name, used in logs and shape errors
    pub name: &'static str,

    /// Indicators whose column this calculator emits
    pub indicators: &'static [Indicator],

    pub compute: fn(&FeatureContext<'_>) -> FeatureTable<K>,
}

impl<K: GrainKey> std::fmt::Debug for Calculator<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculator")
            .field("name", &self.name)
            .field("indicators", &self.indicators)
            .finish()
    }
}

pub fn supplier_calculators() -> Vec<Calculator<SupplierKey>> {
    vec![
        Calculator {
            name: "supplier_registry",
            indicators: &[Indicator::NotInSupplierRegistry],
            compute: supplier::not_in_supplier_registry,
        },
        Calculator {
            name: "ghost_companies",
            indicators: &[Indicator::ReportedGhostCompany],
            compute: supplier::reported_ghost_company,
        },
        Calculator {
            name: "not_located",
            indicators: &[Indicator::NotLocatedByTaxAuthority],
            compute: supplier::not_located_by_tax_authority,
        },
        Calculator {
            name: "success_rate",
            indicators: &[Indicator::HighSuccessRate],
            compute: supplier::high_success_rate,
        },
        Calculator {
            name: "incorporation",
            indicators: &[Indicator::RecentlyIncorporated],
            compute: supplier::recently_incorporated,
        },
        Calculator {
            name: "market_share_by_count",
            indicators: &[Indicator::RiskyMarketShareByCount],
            compute: market::risky_market_share_by_count,
        },
        Calculator {
            name: "market_share_by_amount",
            indicators: &[Indicator::RiskyMarketShareByAmount],
            compute: market::risky_market_share_by_amount,
        },
        Calculator {
            name: "sanctions",
            indicators: &[Indicator::Sanctioned],
            compute: supplier::sanctioned,
        },
        Calculator {
            name: "collusion",
            indicators: &[Indicator::JointBiddingCollusion],
            compute: collusion::joint_bidding_collusion,
        },
        Calculator {
            name: "supplier_audit",
            indicators: &[],
            compute: audit::supplier_audit,
        },
        Calculator {
            name: "subject_shares",
            indicators: &[],
            compute: audit::supplier_subject_shares,
        },
    ]
}

pub fn procedure_calculators() -> Vec<Calculator<ProcedureKey>> {
    vec![
        Calculator {
            name: "secondary_presence",
            indicators: &[Indicator::MissingFromSecondarySource],
            compute: procedure::missing_from_secondary_source,
        },
        Calculator {
            name: "secondary_discrepancy",
            indicators: &[Indicator::CrossSourceDiscrepancy],
            compute: procedure::cross_source_discrepancy,
        },
        Calculator {
            name: "quotations",
            indicators: &[Indicator::SingleQuotationAward],
            compute: procedure::single_quotation_award,
        },
        Calculator {
            name: "meeting_attendance",
            indicators: &[Indicator::MissingMeetingAttendance],
            compute: procedure::missing_meeting_attendance,
        },
        Calculator {
            name: "single_bid",
            indicators: &[Indicator::SingleBid],
            compute: procedure::single_bid,
        },
        Calculator {
            name: "participation",
            indicators: &[Indicator::LowParticipation],
            compute: procedure::low_participation,
        },
        Calculator {
            name: "procedure_audit",
            indicators: &[],
            compute: audit::procedure_audit,
        },
        Calculator {
            name: "listed_winners",
            indicators: &[],
            compute: audit::procedure_listed_winners,
        },
    ]
}

pub fn contract_calculators() -> Vec<Calculator<ContractKey>> {
    vec![
        Calculator {
            name: "meeting_after_publication",
            indicators: &[Indicator::ShortMeetingAfterPublication],
            compute: contract::short_meeting_after_publication,
        },
        Calculator {
            name: "contract_after_meeting",
            indicators: &[Indicator::ShortContractAfterMeeting],
            compute: contract::short_contract_after_meeting,
        },
        Calculator {
            name: "amendments",
            indicators: &[Indicator::HadAmendments],
            compute: contract::had_amendments,
        },
        Calculator {
            name: "delivery_period",
            indicators: &[Indicator::ShortDeliveryPeriod],
            compute: contract::short_delivery_period,
        },
    ]
}

/// Run every calculator of a grain and concatenate their tables
///
/// Fails when any table does not cover `population` exactly; the error
/// lists the shapes of all tables.
pub fn compute_grain<K: GrainKey>(
    name: &str,
    calculators: &[Calculator<K>],
    ctx: &FeatureContext<'_>,
    population: &BTreeSet<K>,
) -> Result<FeatureTable<K>, FeatureTableError> {
    let tables: Vec<FeatureTable<K>> = calculators
        .iter()
        .map(|calculator| {
            let table = (calculator.compute)(ctx);
            tracing::debug!(
                grain = %K::GRAIN,
                calculator = calculator.name,
                rows = table.len(),
                columns = table.columns().len(),
                "computed feature table"
            );
            table
        })
        .collect();
    FeatureTable::concat(name, tables, population)
}

// ============================================================================
// Helpers shared by calculators
// ============================================================================

/// Build a table with one row per population key
pub fn tabulate<K, F>(
    name: &str,
    columns: &[&str],
    population: &BTreeSet<K>,
    mut row: F,
) -> FeatureTable<K>
where
    K: GrainKey,
    F: FnMut(&K) -> Vec<Option<f64>>,
{
    let mut table = FeatureTable::new(name, columns);
    for key in population {
        table.insert(key.clone(), row(key));
    }
    table
}

/// Fold optional flags with OR: any `true` wins, otherwise any `false`,
/// otherwise `None`
pub fn any_flag<I>(flags: I) -> Option<bool>
where
    I: IntoIterator<Item = Option<bool>>,
{
    let mut result = None;
    for flag in flags.into_iter().flatten() {
        if flag {
            return Some(true);
        }
        result = Some(false);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::keys::Grain;
    use std::collections::BTreeMap;

    fn emitted_indicators() -> BTreeMap<Indicator, Vec<(Grain, &'static str)>> {
        let mut emitted: BTreeMap<Indicator, Vec<(Grain, &'static str)>> = BTreeMap::new();
        for c in supplier_calculators() {
            for i in c.indicators {
                emitted.entry(*i).or_default().push((Grain::Supplier, c.name));
            }
        }
        for c in procedure_calculators() {
            for i in c.indicators {
                emitted.entry(*i).or_default().push((Grain::Procedure, c.name));
            }
        }
        for c in contract_calculators() {
            for i in c.indicators {
                emitted.entry(*i).or_default().push((Grain::Contract, c.name));
            }
        }
        emitted
    }

    #[test]
    fn test_every_indicator_has_exactly_one_calculator_of_its_grain() {
        let emitted = emitted_indicators();
        for indicator in Indicator::ALL {
            let owners = emitted.get(&indicator).cloned().unwrap_or_default();
            assert_eq!(owners.len(), 1, "{} owners: {:?}", indicator, owners);
            assert_eq!(owners[0].0, indicator.grain(), "{}", indicator);
        }
    }

    #[test]
    fn test_any_flag() {
        assert_eq!(any_flag(vec![None, Some(false), Some(true)]), Some(true));
        assert_eq!(any_flag(vec![None, Some(false)]), Some(false));
        assert_eq!(any_flag(vec![None, None]), None);
        assert_eq!(any_flag(Vec::new()), None);
    }
}
