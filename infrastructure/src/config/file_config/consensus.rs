//! Consensus configuration from TOML (`[consensus]` section)

use super::ConfigError;
use consensus_application::ConsensusParams;
use consensus_domain::{DEFAULT_DOMAIN, Model};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Raw consensus configuration from TOML
///
/// # Example
///
/// ```toml
/// [consensus]
/// models = ["openai/gpt-4o", "anthropic/claude-sonnet-4.5", "google/gemini-2.5-pro"]
/// judge = "anthropic/claude-sonnet-4.5"
/// domain = "Psychology"
/// agent_timeout_seconds = 90
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsensusConfig {
    /// Models queried in the divergent phase, in order
    pub models: Vec<String>,
    /// File with one model per line, used when `models` is empty
    pub models_file: Option<PathBuf>,
    /// Judge model; the first model when unset
    pub judge: Option<String>,
    pub domain: String,
    pub agent_timeout_seconds: u64,
    pub max_synthesis_attempts: usize,
    pub heartbeat_seconds: u64,
    pub include_reasoning: bool,
    pub include_confidence: bool,
    pub include_theoretical_framework: bool,
}

impl Default for FileConsensusConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            models_file: None,
            judge: None,
            domain: DEFAULT_DOMAIN.to_string(),
            agent_timeout_seconds: 120,
            max_synthesis_attempts: 3,
            heartbeat_seconds: 15,
            include_reasoning: true,
            include_confidence: true,
            include_theoretical_framework: false,
        }
    }
}

impl FileConsensusConfig {
    /// Configured models, from `models` or else `models_file`.
    pub fn parse_models(&self) -> Result<Vec<Model>, ConfigError> {
        if self.models.is_empty() {
            return match &self.models_file {
                Some(path) => load_models_file(path),
                None => Ok(Vec::new()),
            };
        }

        self.models
            .iter()
            .map(|name| {
                Model::try_new(name.as_str()).ok_or_else(|| ConfigError::EmptyModelName {
                    field: "consensus.models".to_string(),
                })
            })
            .collect()
    }

    pub fn parse_judge(&self) -> Result<Option<Model>, ConfigError> {
        match &self.judge {
            None => Ok(None),
            Some(name) => Model::try_new(name.as_str())
                .map(Some)
                .ok_or_else(|| ConfigError::EmptyModelName {
                    field: "consensus.judge".to_string(),
                }),
        }
    }

    /// Convert into run parameters, rejecting values the pipeline cannot use.
    pub fn to_params(&self) -> Result<ConsensusParams, ConfigError> {
        if self.agent_timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout("agent_timeout_seconds"));
        }
        if self.heartbeat_seconds == 0 {
            return Err(ConfigError::InvalidTimeout("heartbeat_seconds"));
        }
        if self.max_synthesis_attempts == 0 {
            return Err(ConfigError::InvalidAttempts);
        }

        let mut params = ConsensusParams::default()
            .with_agent_timeout(Duration::from_secs(self.agent_timeout_seconds))
            .with_max_synthesis_attempts(self.max_synthesis_attempts)
            .with_heartbeat_interval(Duration::from_secs(self.heartbeat_seconds))
            .with_domain(self.domain.trim())
            .with_judge(self.parse_judge()?)
            .with_theoretical_framework(self.include_theoretical_framework);
        params.include_reasoning = self.include_reasoning;
        params.include_confidence = self.include_confidence;
        Ok(params)
    }
}

/// Read a models file: one model per line, blank lines and `#` comments skipped.
pub fn load_models_file(path: &Path) -> Result<Vec<Model>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ModelsFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Model::parse_list(&text))
}
