//! Indicator registry
//!
//! The closed set of binary risk indicators that enter the score. Each
//! indicator belongs to exactly one grain and carries a default weight in
//! `{1, 2, 3}`. [`Indicator::ALL`] fixes the column order of every scored
//! output.

use crate::models::keys::Grain;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    // Supplier grain
    NotInSupplierRegistry,
    ReportedGhostCompany,
    NotLocatedByTaxAuthority,
    HighSuccessRate,
    RecentlyIncorporated,
    RiskyMarketShareByCount,
    RiskyMarketShareByAmount,
    Sanctioned,
    JointBiddingCollusion,

    // Procedure grain
    MissingFromSecondarySource,
    CrossSourceDiscrepancy,
    SingleQuotationAward,
    MissingMeetingAttendance,
    SingleBid,
    LowParticipation,

    // Contract grain
    ShortMeetingAfterPublication,
    ShortContractAfterMeeting,
    HadAmendments,
    ShortDeliveryPeriod,
}

impl Indicator {
    /// Number of registered indicators
    pub const COUNT: usize = 19;

    /// Every indicator in output column order
    pub const ALL: [Indicator; Indicator::COUNT] = [
        Indicator::NotInSupplierRegistry,
        Indicator::ReportedGhostCompany,
        Indicator::NotLocatedByTaxAuthority,
        Indicator::HighSuccessRate,
        Indicator::RecentlyIncorporated,
        Indicator::RiskyMarketShareByCount,
        Indicator::RiskyMarketShareByAmount,
        Indicator::Sanctioned,
        Indicator::JointBiddingCollusion,
        Indicator::MissingFromSecondarySource,
        Indicator::CrossSourceDiscrepancy,
        Indicator::SingleQuotationAward,
        Indicator::MissingMeetingAttendance,
        Indicator::SingleBid,
        Indicator::LowParticipation,
        Indicator::ShortMeetingAfterPublication,
        Indicator::ShortContractAfterMeeting,
        Indicator::HadAmendments,
        Indicator::ShortDeliveryPeriod,
    ];

    /// Column name of the indicator
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::NotInSupplierRegistry => "not_in_supplier_registry",
            Indicator::ReportedGhostCompany => "reported_ghost_company",
            Indicator::NotLocatedByTaxAuthority => "not_located_by_tax_authority",
            Indicator::HighSuccessRate => "high_success_rate",
            Indicator::RecentlyIncorporated => "recently_incorporated",
            Indicator::RiskyMarketShareByCount => "risky_market_share_by_count",
            Indicator::RiskyMarketShareByAmount => "risky_market_share_by_amount",
            Indicator::Sanctioned => "sanctioned",
            Indicator::JointBiddingCollusion => "joint_bidding_collusion",
            Indicator::MissingFromSecondarySource => "missing_from_secondary_source",
            Indicator::CrossSourceDiscrepancy => "cross_source_discrepancy",
            Indicator::SingleQuotationAward => "single_quotation_award",
            Indicator::MissingMeetingAttendance => "missing_meeting_attendance",
            Indicator::SingleBid => "single_bid",
            Indicator::LowParticipation => "low_participation",
            Indicator::ShortMeetingAfterPublication => "short_meeting_after_publication",
            Indicator::ShortContractAfterMeeting => "short_contract_after_meeting",
            Indicator::HadAmendments => "had_amendments",
            Indicator::ShortDeliveryPeriod => "short_delivery_period",
        }
    }

    pub fn grain(&self) -> Grain {
        match self {
            Indicator::NotInSupplierRegistry
            | Indicator::ReportedGhostCompany
            | Indicator::NotLocatedByTaxAuthority
            | Indicator::HighSuccessRate
            | Indicator::RecentlyIncorporated
            | Indicator::RiskyMarketShareByCount
            | Indicator::RiskyMarketShareByAmount
            | Indicator::Sanctioned
            | Indicator::JointBiddingCollusion => Grain::Supplier,

            Indicator::MissingFromSecondarySource
            | Indicator::CrossSourceDiscrepancy
            | Indicator::SingleQuotationAward
            | Indicator::MissingMeetingAttendance
            | Indicator::SingleBid
            | Indicator::LowParticipation => Grain::Procedure,

            Indicator::ShortMeetingAfterPublication
            | Indicator::ShortContractAfterMeeting
            | Indicator::HadAmendments
            | Indicator::ShortDeliveryPeriod => Grain::Contract,
        }
    }

    /// Weight used when the configuration does not override it
    pub fn default_weight(&self) -> u8 {
        match self {
            Indicator::ReportedGhostCompany
            | Indicator::RecentlyIncorporated
            | Indicator::Sanctioned
            | Indicator::JointBiddingCollusion => 3,

            Indicator::MissingFromSecondarySource
            | Indicator::SingleQuotationAward
            | Indicator::SingleBid
            | Indicator::ShortMeetingAfterPublication
            | Indicator::ShortContractAfterMeeting
            | Indicator::ShortDeliveryPeriod => 2,

            Indicator::NotInSupplierRegistry
            | Indicator::NotLocatedByTaxAuthority
            | Indicator::HighSuccessRate
            | Indicator::RiskyMarketShareByCount
            | Indicator::RiskyMarketShareByAmount
            | Indicator::CrossSourceDiscrepancy
            | Indicator::MissingMeetingAttendance
            | Indicator::LowParticipation
            | Indicator::HadAmendments => 1,
        }
    }

    /// Indicators of one grain, in registry order
    pub fn of_grain(grain: Grain) -> impl Iterator<Item = Indicator> {
        Self::ALL.into_iter().filter(move |i| i.grain() == grain)
    }

    pub fn from_name(name: &str) -> Option<Indicator> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Indicator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Indicator::from_name(s).ok_or_else(|| format!("unknown indicator '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for indicator in Indicator::ALL {
            assert_eq!(indicator.name().parse::<Indicator>(), Ok(indicator));
        }
    }

    #[test]
    fn test_serde_name_matches_column_name() {
        for indicator in Indicator::ALL {
            let json = serde_json::to_string(&indicator).unwrap();
            assert_eq!(json, format!("\"{}\"", indicator.name()));
        }
    }

    #[test]
    fn test_grain_counts() {
        assert_eq!(Indicator::of_grain(Grain::Supplier).count(), 9);
        assert_eq!(Indicator::of_grain(Grain::Procedure).count(), 6);
        assert_eq!(Indicator::of_grain(Grain::Contract).count(), 4);
    }
}
