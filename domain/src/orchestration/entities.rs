//! Orchestration domain entities

use crate::core::error::DomainError;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Phase of a consensus run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Divergent collection - every model answers the prompt in parallel
    Divergent,
    /// Convergent synthesis - the judge reconciles the collected answers
    Synthesis,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Divergent => "divergent",
            Phase::Synthesis => "synthesis",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::Divergent => "Divergent Collection",
            Phase::Synthesis => "Convergent Synthesis",
        }
    }

    /// 1-based position of the phase within a run
    pub fn number(&self) -> usize {
        match self {
            Phase::Divergent => 1,
            Phase::Synthesis => 2,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Identifier of one end-to-end run (Value Object)
///
/// Used as a directory name for intermediate responses and as the log file
/// suffix, so it is restricted to ASCII alphanumerics, `-`, `_` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(String);

impl RunId {
    /// Generate a fresh id of the form `YYYYMMDD-HHMMSS-xxxxxxxx`.
    pub fn generate() -> Self {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let simple = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", stamp, &simple[..8]))
    }

    /// Validate a caller-supplied id.
    pub fn parse(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if valid {
            Ok(Self(id))
        } else {
            Err(DomainError::InvalidRunId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RunId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RunId::parse(value)
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}
