//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod collect_responses;
pub mod run_consensus;
pub mod synthesize;
