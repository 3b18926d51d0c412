//! Leaf helpers shared by every calculator
//!
//! - **names**: company name normalization (the entity key)
//! - **tax_id**: tax ID cleanup and incorporation date derivation
//! - **dates**: milestone date arithmetic

pub mod dates;
pub mod names;
pub mod tax_id;
