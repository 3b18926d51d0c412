//! Entity resolution
//!
//! - **consortium**: splits joint awards into one row per member
//! - **base**: builds the prepared base table and the per-grain populations

pub mod base;
pub mod consortium;

pub use base::{BaseTable, Populations, PreparationConfig};
pub use consortium::{expand_consortia, split_participant_keys, ExpandedRow};
