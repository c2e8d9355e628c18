//! Model value object representing an LLM backend identifier

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a model backend (Value Object)
///
/// Identifiers are opaque to the domain: whatever the chat-completions
/// endpoint accepts (`openai/gpt-4o`, `anthropic/claude-sonnet-4.5`, ...)
/// is a valid model. The only rule is that the identifier is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Model(String);

impl Model {
    /// Create a model identifier.
    ///
    /// # Panics
    /// Panics if the identifier is empty or only whitespace
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        assert!(!id.trim().is_empty(), "Model identifier cannot be empty");
        Self(id.trim().to_string())
    }

    /// Try to create a model identifier, returning None if invalid
    pub fn try_new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a list of models from text with one identifier per line.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse_list(text: &str) -> Vec<Model> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(Model::try_new)
            .collect()
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Model {
    type Err = crate::core::error::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::try_new(s).ok_or_else(|| crate::core::error::DomainError::InvalidModel(s.to_string()))
    }
}

impl From<&str> for Model {
    fn from(s: &str) -> Self {
        Model::new(s)
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_roundtrip() {
        let model = Model::new("openai/gpt-4o");
        let parsed: Model = model.to_string().parse().unwrap();
        assert_eq!(model, parsed);
    }

    #[test]
    fn test_model_trims_whitespace() {
        let model = Model::new("  anthropic/claude-sonnet-4.5 \n");
        assert_eq!(model.as_str(), "anthropic/claude-sonnet-4.5");
    }

    #[test]
    fn test_empty_model_rejected() {
        assert!(Model::try_new("").is_none());
        assert!(Model::try_new("   ").is_none());
        assert!("".parse::<Model>().is_err());
    }

    #[test]
    #[should_panic]
    fn test_empty_model_panics() {
        Model::new(" ");
    }

    #[test]
    fn test_parse_list_skips_blank_and_comment_lines() {
        let models = Model::parse_list("openai/gpt-4o\n\n# judge candidates\n  google/gemini-2.5-pro  \r\nx-ai/grok-4\n");
        assert_eq!(
            models,
            vec![
                Model::new("openai/gpt-4o"),
                Model::new("google/gemini-2.5-pro"),
                Model::new("x-ai/grok-4"),
            ]
        );
    }

    #[test]
    fn test_model_serde_as_string() {
        let json = serde_json::to_string(&Model::new("openai/gpt-4o")).unwrap();
        assert_eq!(json, "\"openai/gpt-4o\"");
        let back: Model = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "openai/gpt-4o");
        assert!(serde_json::from_str::<Model>("\"\"").is_err());
    }
}
