//! Domain models for the risk engine

pub mod contract;
pub mod feature;
pub mod keys;
pub mod reference;
pub mod tables;

// Re-exports
pub use contract::{BaseRow, ContractRecord, ProcedureType};
pub use feature::{flag_value, FeatureTable, FeatureTableError};
pub use keys::{ContractKey, Grain, GrainKey, ProcedureKey, SupplierKey};
pub use reference::{
    GhostCompanyEntry, GhostStatus, ReferenceEntry, ReferenceIndex, ReferenceList,
    ReferenceTables,
};
pub use tables::{
    AttendanceRecord, BidRecord, PossibleBidderRecord, QuotationRecord, SecondaryRecord,
};
