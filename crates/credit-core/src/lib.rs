//! # credit-core
//! Foundation types, traits and input normalisation for wallet credit scoring.

pub mod constants;
pub mod error;
pub mod normalize;
pub mod sanitize;
pub mod traits;
pub mod types;
