//! Per-model response produced by the divergent phase

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary used when a model did not emit a `<summary>` tag
pub const NO_SUMMARY_PROVIDED: &str = "No summary provided by model";

/// Parsed answer from a single model (Value Object)
///
/// One instance per successfully-responding model. Persisted between the
/// two phases, so every field round-trips through JSON unchanged. Field
/// names are written in camelCase and accepted in PascalCase or snake_case
/// as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    /// The model that generated this response
    #[serde(alias = "ModelName", alias = "model_name")]
    pub model_name: String,
    /// Answer text with recognized tags and sections removed
    #[serde(alias = "Answer")]
    pub answer: String,
    /// Labeled reasoning section, empty when absent
    #[serde(default, alias = "Reasoning")]
    pub reasoning: String,
    /// Self-reported confidence in [0.0, 1.0], 0.0 when absent
    #[serde(default, alias = "ConfidenceScore", alias = "confidence_score")]
    pub confidence_score: f64,
    /// Short summary from the `<summary>` tag
    #[serde(default = "default_summary", alias = "Summary")]
    pub summary: String,
    /// When the query was issued
    #[serde(alias = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Not tracked by the gateway; always 0
    #[serde(default, alias = "TokensUsed", alias = "tokens_used")]
    pub tokens_used: u32,
}

fn default_summary() -> String {
    NO_SUMMARY_PROVIDED.to_string()
}

impl ModelResponse {
    /// Creates a response with no reasoning, zero confidence and the default summary.
    pub fn new(
        model_name: impl Into<String>,
        answer: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            answer: answer.into(),
            reasoning: String::new(),
            confidence_score: 0.0,
            summary: default_summary(),
            timestamp,
            tokens_used: 0,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Sets the confidence, clamped to [0.0, 1.0].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence_score = clamp_unit(confidence);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Returns `true` if the model produced a reasoning section.
    pub fn has_reasoning(&self) -> bool {
        !self.reasoning.trim().is_empty()
    }

    /// Returns `true` if the model reported a non-zero confidence.
    pub fn has_confidence(&self) -> bool {
        self.confidence_score > 0.0
    }
}

/// Clamp a score into [0.0, 1.0]; NaN becomes 0.0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
