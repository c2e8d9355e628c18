//! API configuration from TOML (`[api]` section)

use super::ConfigError;
use serde::{Deserialize, Serialize};

/// Raw chat-completions endpoint configuration
///
/// # Example
///
/// ```toml
/// [api]
/// endpoint = "https://openrouter.ai/api/v1"
/// api_key = "sk-..."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileApiConfig {
    /// Base URL; `/chat/completions` is appended
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl FileApiConfig {
    /// Endpoint and key, both required to talk to a backend
    pub fn credentials(&self) -> Result<(String, String), ConfigError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        Ok((endpoint.to_string(), api_key.to_string()))
    }

    /// Key with everything but the last four characters masked
    pub fn masked_key(&self) -> Option<String> {
        self.api_key.as_deref().map(|key| {
            let tail: String = key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("****{}", tail)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials() {
        let config = FileApiConfig {
            endpoint: Some(" https://api.example.com/v1 ".to_string()),
            api_key: Some("secret".to_string()),
        };
        let (endpoint, key) = config.credentials().unwrap();
        assert_eq!(endpoint, "https://api.example.com/v1");
        assert_eq!(key, "secret");
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = FileApiConfig::default();
        assert!(matches!(config.credentials(), Err(ConfigError::MissingEndpoint)));

        config.endpoint = Some("https://api.example.com/v1".to_string());
        config.api_key = Some("   ".to_string());
        assert!(matches!(config.credentials(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_masked_key() {
        let config = FileApiConfig {
            endpoint: None,
            api_key: Some("sk-abcdef1234".to_string()),
        };
        assert_eq!(config.masked_key().as_deref(), Some("****1234"));
        assert!(FileApiConfig::default().masked_key().is_none());
    }
}
