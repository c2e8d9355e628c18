//! Consensus domain
//!
//! Value objects flowing through the two-phase pipeline:
//!
//! ```text
//! ConsensusRequest ──► Phase 1: Divergent Collection ──► Vec<ModelResponse>
//!                                                             │
//!                          (persisted per model, per run)     ▼
//!                      Phase 2: Convergent Synthesis ──► ConsensusResult
//! ```
//!
//! The failure threshold ([`minimum_agents_required`]) lives here because it
//! is policy, not plumbing: no [`ConsensusResult`] may exist with fewer
//! individual responses than the threshold.

pub mod request;
pub mod response;
pub mod result;

pub use request::{ConsensusRequest, DEFAULT_DOMAIN, minimum_agents_required};
pub use response::{ModelResponse, NO_SUMMARY_PROVIDED};
pub use result::{ConsensusLevel, ConsensusPoint, ConsensusResult, Disagreement, DissentingView};
