//! # credit-features: wallet behaviour features and the synthetic target.
//!
//! - **Aggregation**: partitions normalized transactions by wallet and reduces
//!   each partition to a fixed 16-wide [`WalletFeatureVector`] of counts, USD
//!   sums, ratios and temporal statistics. Output is independent of input
//!   order.
//! - **Synthetic target**: a fixed weighted formula over the features, min-max
//!   rescaled to `[0, 1000]` across the wallet population of the run.
//!
//! [`WalletFeatureVector`]: credit_core::types::WalletFeatureVector

pub mod aggregate;
pub mod target;

pub use aggregate::{aggregate, aggregate_sanitized};
pub use target::{build_targets, raw_target, SyntheticTarget};
