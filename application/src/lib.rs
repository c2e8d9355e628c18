//! Application layer for llm-consensus
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ConsensusParams;
pub use ports::{
    llm_gateway::{GatewayError, LlmGateway},
    progress::{NoProgress, ProgressNotifier},
    response_store::{ResponseStore, StoreError},
    run_logger::{LogLevel, NoRunLogger, RunLogger},
};
pub use use_cases::collect_responses::{
    CollectResponsesUseCase, CollectionOutput, CollectionReport, ModelOutcome,
};
pub use use_cases::run_consensus::{RunConsensusError, RunConsensusInput, RunConsensusUseCase};
pub use use_cases::synthesize::{SynthesisError, SynthesizeUseCase};
