//! Intermediate response store port
//!
//! Phase 1 responses are persisted between the two phases so that a failed
//! synthesis attempt can be retried from what was saved.

use async_trait::async_trait;
use consensus_domain::ModelResponse;
use thiserror::Error;

/// Errors that can occur while saving or loading responses
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid run id: {0:?}")]
    InvalidRunId(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Storage for the responses collected during one run
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Persist every response under `run_id`, one record per model.
    async fn save(&self, run_id: &str, responses: &[ModelResponse]) -> Result<(), StoreError>;

    /// Load every readable response saved under `run_id`.
    ///
    /// A run that was never saved yields an empty list, not an error.
    async fn load(&self, run_id: &str) -> Result<Vec<ModelResponse>, StoreError>;

    /// Whether anything has been saved under `run_id`.
    async fn exists(&self, run_id: &str) -> Result<bool, StoreError>;
}
