//! Configuration file loading for llm-consensus
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./consensus.toml` or `./.consensus.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/llm-consensus/config.toml`
//! 4. Environment: `CONSENSUS_API_ENDPOINT`, `CONSENSUS_API_KEY`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigError, FileApiConfig, FileConfig, FileConsensusConfig, FileOutputConfig,
    load_models_file,
};
pub use loader::ConfigLoader;
