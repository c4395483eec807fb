//! Integration test suite for wallet credit scoring.
//!
//! Tests here drive the public APIs of several crates together: JSON ledger
//! in, scores and reports out. Property tests check the invariants that must
//! hold for any ledger, however malformed its numeric fields.

pub mod helpers;
