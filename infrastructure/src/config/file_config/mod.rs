//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod api;
mod consensus;
mod output;

pub use api::FileApiConfig;
pub use consensus::{FileConsensusConfig, load_models_file};
pub use output::FileOutputConfig;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("API endpoint is not configured (set [api] endpoint or CONSENSUS_API_ENDPOINT)")]
    MissingEndpoint,

    #[error("API key is not configured (set [api] api_key or CONSENSUS_API_KEY)")]
    MissingApiKey,

    #[error("{0} cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("max_synthesis_attempts cannot be 0")]
    InvalidAttempts,

    #[error("{field}: model name cannot be empty")]
    EmptyModelName { field: String },

    #[error("Cannot read models file {}: {source}", .path.display())]
    ModelsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat-completions endpoint
    pub api: FileApiConfig,
    /// Run control and model selection
    pub consensus: FileConsensusConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the parts that do not depend on the command line.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.consensus.to_params()?;
        if !self.consensus.models.is_empty() {
            self.consensus.parse_models()?;
        }
        Ok(())
    }
}
