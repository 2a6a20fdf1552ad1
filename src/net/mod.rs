//! Top-level heuristic scorer.
//!
//! [`Net`] composes feature encoders, one embedding network, the heuristic
//! head and the optional partition-estimate head. Its output feeds the
//! ant-colony search as an `N x N` heuristic matrix via [`Net::reshape`].
//!
//! # Key Types
//!
//! - [`NetConfig`]: variant, shape, heads, seed
//! - [`Net`]: `score`, `score_with_partition_estimate`, `freeze_embedding`,
//!   `reshape`

mod config;
mod scorer;

pub use config::NetConfig;
pub use scorer::Net;
