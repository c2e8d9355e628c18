//! Configuration file loader with multi-source merging

use super::file_config::{ConfigError, FileConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_CONFIG_FILES: [&str; 2] = ["consensus.toml", ".consensus.toml"];
const ENV_PREFIX: &str = "CONSENSUS_";

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. Project root: `./consensus.toml` or `./.consensus.toml`
    /// 3. XDG config: `$XDG_CONFIG_HOME/llm-consensus/config.toml`
    /// 4. `CONSENSUS_API_ENDPOINT` / `CONSENSUS_API_KEY`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Self::env());

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Defaults plus environment only (for --no-config)
    pub fn load_defaults() -> Result<FileConfig, ConfigError> {
        Figment::new()
            .merge(Serialized::defaults(FileConfig::default()))
            .merge(Self::env())
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// `CONSENSUS_API_ENDPOINT` and `CONSENSUS_API_KEY` mapped into `[api]`
    fn env() -> Env {
        Env::prefixed(ENV_PREFIX)
            .only(&["api_endpoint", "api_key"])
            .map(|key| {
                if key == "api_endpoint" {
                    "api.endpoint".into()
                } else {
                    "api.api_key".into()
                }
            })
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/llm-consensus/config.toml if set,
    /// otherwise the platform config directory equivalent.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("llm-consensus").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for --show-config)
    pub fn describe_sources(explicit: Option<&Path>) -> Vec<String> {
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            lines.push(format!("  [{:<7}] Explicit: {}", mark, path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND  ] Project: {}", path.display())),
            None => lines.push("  [       ] Project: ./consensus.toml or ./.consensus.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "" };
            lines.push(format!("  [{:<7}] Global:  {}", mark, path.display()));
        }

        lines.push(format!("  [       ] Env:     {}API_ENDPOINT, {}API_KEY", ENV_PREFIX, ENV_PREFIX));
        lines.push("  [       ] Default: built-in defaults".to_string());
        lines
    }
}
