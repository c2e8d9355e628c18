//! Application-level configuration.
//!
//! - [`ConsensusParams`]: timeouts, retry budget and prompt switches of a run

pub mod consensus_params;

pub use consensus_params::ConsensusParams;
