//! Group-relative statistics
//!
//! - **quantile**: linear-interpolation quantile
//! - **threshold**: partition → quantile → broadcast primitive shared by the
//!   date-interval and market-share calculators

pub mod quantile;
pub mod threshold;

pub use quantile::quantile;
pub use threshold::{SegmentedThreshold, ThresholdDirection};
