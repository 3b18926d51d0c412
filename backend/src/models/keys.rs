//! Entity keys for the three feature grains
//!
//! Every feature table is keyed by exactly one of these types. Keys are
//! `Ord` so tables iterate in a deterministic order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity level at which a feature table is keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grain {
    /// One row per `(event_id, contract_number)`
    Contract,
    /// One row per `event_id`
    Procedure,
    /// One row per normalized supplier name
    Supplier,
}

impl fmt::Display for Grain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grain::Contract => write!(f, "contract"),
            Grain::Procedure => write!(f, "procedure"),
            Grain::Supplier => write!(f, "supplier"),
        }
    }
}

/// Key type of a feature grain
pub trait GrainKey: Clone + Ord + fmt::Debug {
    /// Grain this key identifies
    const GRAIN: Grain;

    /// Column names used when the key is written out
    fn key_columns() -> &'static [&'static str];

    /// Column values in the order of [`GrainKey::key_columns`]
    fn key_values(&self) -> Vec<String>;
}

/// Contract identifier: procedure plus contract number
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContractKey {
    pub event_id: String,
    pub contract_number: String,
}

impl ContractKey {
    pub fn new(event_id: impl Into<String>, contract_number: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            contract_number: contract_number.into(),
        }
    }

    /// Procedure this contract was awarded under
    pub fn procedure(&self) -> ProcedureKey {
        ProcedureKey(self.event_id.clone())
    }
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.event_id, self.contract_number)
    }
}

impl GrainKey for ContractKey {
    const GRAIN: Grain = Grain::Contract;

    fn key_columns() -> &'static [&'static str] {
        &["event_id", "contract_number"]
    }

    fn key_values(&self) -> Vec<String> {
        vec![self.event_id.clone(), self.contract_number.clone()]
    }
}

/// Procedure identifier (`event_id`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcedureKey(pub String);

impl ProcedureKey {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self(event_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcedureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl GrainKey for ProcedureKey {
    const GRAIN: Grain = Grain::Procedure;

    fn key_columns() -> &'static [&'static str] {
        &["event_id"]
    }

    fn key_values(&self) -> Vec<String> {
        vec![self.0.clone()]
    }
}

/// Supplier identifier: the normalized company name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SupplierKey(pub String);

impl SupplierKey {
    pub fn new(normalized_name: impl Into<String>) -> Self {
        Self(normalized_name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SupplierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl GrainKey for SupplierKey {
    const GRAIN: Grain = Grain::Supplier;

    fn key_columns() -> &'static [&'static str] {
        &["razon_social_simple"]
    }

    fn key_values(&self) -> Vec<String> {
        vec![self.0.clone()]
    }
}
