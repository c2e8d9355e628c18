//! Domain layer for llm-consensus
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Two-phase consensus
//!
//! - **Divergent collection**: every configured model answers the same
//!   prompt independently and in parallel
//! - **Convergent synthesis**: a judge model reconciles the collected
//!   answers into one [`ConsensusResult`]
//!
//! A run only reaches synthesis when at least
//! [`minimum_agents_required`] models answered.

pub mod config;
pub mod consensus;
pub mod core;
pub mod orchestration;
pub mod parsing;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use consensus::{
    ConsensusLevel, ConsensusPoint, ConsensusRequest, ConsensusResult, DEFAULT_DOMAIN,
    Disagreement, DissentingView, ModelResponse, NO_SUMMARY_PROVIDED, minimum_agents_required,
};
pub use config::OutputFormat;
pub use core::{error::DomainError, model::Model, question::Question};
pub use orchestration::{Phase, RunId};
pub use parsing::{
    ParsedSynthesis, SynthesisFormat, normalize_confidence, parse_model_response, parse_synthesis,
};
pub use prompt::PromptTemplate;
pub use session::entities::{Message, Role};
