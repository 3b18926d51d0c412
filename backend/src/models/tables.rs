//! Auxiliary input tables
//!
//! Rows of the side tables attached to the disclosure records: who bid,
//! how many quotations a direct award collected, who attended the
//! clarification meeting, who was considered as a possible bidder, and the
//! procedure as seen by the secondary portal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One bidder entry of a contract's bid roster (`ofertas`)
///
/// `bidder` may name several companies separated by "/" when they bid
/// jointly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRecord {
    pub contract_number: String,
    pub bidder: String,
}

impl BidRecord {
    pub fn new(contract_number: impl Into<String>, bidder: impl Into<String>) -> Self {
        Self {
            contract_number: contract_number.into(),
            bidder: bidder.into(),
        }
    }
}

/// Number of quotations collected for a procedure (`cotizaciones`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationRecord {
    pub event_id: String,
    pub quotations: u32,
}

impl QuotationRecord {
    pub fn new(event_id: impl Into<String>, quotations: u32) -> Self {
        Self {
            event_id: event_id.into(),
            quotations,
        }
    }
}

/// One attendee of a procedure's clarification meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub event_id: String,
    pub attendee: String,
}

impl AttendanceRecord {
    pub fn new(event_id: impl Into<String>, attendee: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            attendee: attendee.into(),
        }
    }
}

/// One company considered as a possible bidder for a procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossibleBidderRecord {
    pub event_id: String,
    pub company: String,
}

impl PossibleBidderRecord {
    pub fn new(event_id: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            company: company.into(),
        }
    }
}

/// A procedure row scraped from the secondary portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryRecord {
    pub event_id: String,

    /// Winner as published on the portal (may be "A / B")
    #[serde(default)]
    pub supplier_name: Option<String>,

    #[serde(default)]
    pub amount_max: Option<f64>,

    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
}

impl SecondaryRecord {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            supplier_name: None,
            amount_max: None,
            publication_date: None,
        }
    }

    pub fn with_supplier(mut self, name: impl Into<String>) -> Self {
        self.supplier_name = Some(name.into());
        self
    }

    pub fn with_amount_max(mut self, amount: f64) -> Self {
        self.amount_max = Some(amount);
        self
    }

    pub fn with_publication_date(mut self, date: NaiveDate) -> Self {
        self.publication_date = Some(date);
        self
    }
}

/// Canonical form of a procedure identifier for cross-source matching
pub fn canonical_event_id(event_id: &str) -> String {
    event_id.trim().to_uppercase()
}
