//! Final consensus result and the judge's agreement/disagreement breakdown

use super::response::ModelResponse;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Categorical strength of agreement reported by the judge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConsensusLevel {
    /// Broad agreement among the models
    StrongConsensus,
    /// Agreement on the main points with some divergence
    ModerateConsensus,
    /// Partial agreement only
    WeakConsensus,
    /// No meaningful agreement (also used when the judge gave no level)
    #[default]
    Conflicted,
}

impl ConsensusLevel {
    /// Derive a level from free-form judge text.
    ///
    /// Case-insensitive substring match on "strong", "moderate" and "weak",
    /// checked in that order; anything else (including empty text) is
    /// [`ConsensusLevel::Conflicted`].
    pub fn from_label(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("strong") {
            ConsensusLevel::StrongConsensus
        } else if lower.contains("moderate") {
            ConsensusLevel::ModerateConsensus
        } else if lower.contains("weak") {
            ConsensusLevel::WeakConsensus
        } else {
            ConsensusLevel::Conflicted
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConsensusLevel::StrongConsensus => "Strong Consensus",
            ConsensusLevel::ModerateConsensus => "Moderate Consensus",
            ConsensusLevel::WeakConsensus => "Weak Consensus",
            ConsensusLevel::Conflicted => "Conflicted",
        }
    }
}

impl std::fmt::Display for ConsensusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A point the judge listed as agreed upon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusPoint {
    pub point: String,
    /// Number of supporting models, as stated by the judge (0 when unstated)
    pub supporting_models: usize,
    pub model_names: Vec<String>,
}

impl ConsensusPoint {
    pub fn new(point: impl Into<String>) -> Self {
        Self {
            point: point.into(),
            supporting_models: 0,
            model_names: Vec::new(),
        }
    }

    /// Attach the models the judge named as supporting this point.
    pub fn with_models(mut self, model_names: Vec<String>) -> Self {
        self.supporting_models = model_names.len();
        self.model_names = model_names;
        self
    }
}

/// One model's stance inside a disagreement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DissentingView {
    pub model_name: String,
    pub position: String,
    #[serde(default)]
    pub reasoning: String,
}

impl DissentingView {
    pub fn new(model_name: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            position: position.into(),
            reasoning: String::new(),
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}

/// A topic on which the models disagreed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disagreement {
    pub topic: String,
    pub views: Vec<DissentingView>,
    /// Set only when the judge flags the disagreement as theoretical
    #[serde(default)]
    pub is_legitimate_theoretical: bool,
}

impl Disagreement {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            views: Vec::new(),
            is_legitimate_theoretical: false,
        }
    }

    pub fn with_view(mut self, view: DissentingView) -> Self {
        self.views.push(view);
        self
    }
}

/// Complete result of a consensus run
///
/// Built once at the end of a successful run and handed to renderers by
/// value. `individual_responses` follows the configured model order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    pub synthesized_answer: String,
    pub synthesis_reasoning: String,
    pub summary: String,
    /// Judge confidence in [0.0, 1.0]
    pub overall_confidence: f64,
    pub consensus_level: ConsensusLevel,
    pub individual_responses: Vec<ModelResponse>,
    pub agreement_points: Vec<ConsensusPoint>,
    pub disagreements: Vec<Disagreement>,
    #[serde(with = "duration_secs")]
    pub total_processing_time: Duration,
    pub original_prompt: String,
    /// Model that performed the synthesis
    pub judge_model: String,
    /// Run identifier used for persistence and logging
    pub run_id: String,
}

impl ConsensusResult {
    /// Number of models whose answers were synthesized
    pub fn model_count(&self) -> usize {
        self.individual_responses.len()
    }

    /// Mean self-reported confidence over responses that reported one
    pub fn average_model_confidence(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .individual_responses
            .iter()
            .filter(|r| r.has_confidence())
            .map(|r| r.confidence_score)
            .collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }
}

/// Serialize a [`Duration`] as fractional seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_consensus_level_from_label() {
        assert_eq!(ConsensusLevel::from_label("Strong"), ConsensusLevel::StrongConsensus);
        assert_eq!(
            ConsensusLevel::from_label("STRONG CONSENSUS"),
            ConsensusLevel::StrongConsensus
        );
        assert_eq!(
            ConsensusLevel::from_label("moderate consensus (4/5 models)"),
            ConsensusLevel::ModerateConsensus
        );
        assert_eq!(ConsensusLevel::from_label("Weak"), ConsensusLevel::WeakConsensus);
        assert_eq!(ConsensusLevel::from_label("Conflicted"), ConsensusLevel::Conflicted);
        assert_eq!(ConsensusLevel::from_label("split"), ConsensusLevel::Conflicted);
        assert_eq!(ConsensusLevel::from_label(""), ConsensusLevel::Conflicted);
    }

    #[test]
    fn test_consensus_level_display() {
        assert_eq!(ConsensusLevel::StrongConsensus.to_string(), "Strong Consensus");
        assert_eq!(ConsensusLevel::default(), ConsensusLevel::Conflicted);
    }

    #[test]
    fn test_consensus_point_with_models() {
        let point = ConsensusPoint::new("Paris is the capital")
            .with_models(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(point.supporting_models, 2);
        assert_eq!(point.model_names, vec!["a", "b"]);
    }

    #[test]
    fn test_result_serializes_duration_as_seconds() {
        let result = ConsensusResult {
            synthesized_answer: "Paris".to_string(),
            synthesis_reasoning: String::new(),
            summary: String::new(),
            overall_confidence: 0.9,
            consensus_level: ConsensusLevel::StrongConsensus,
            individual_responses: vec![
                ModelResponse::new("a", "Paris", Utc::now()).with_confidence(0.8),
                ModelResponse::new("b", "Paris", Utc::now()),
                ModelResponse::new("c", "Paris", Utc::now()).with_confidence(0.6),
            ],
            agreement_points: vec![],
            disagreements: vec![],
            total_processing_time: Duration::from_millis(1500),
            original_prompt: "Capital of France?".to_string(),
            judge_model: "a".to_string(),
            run_id: "run-1".to_string(),
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["totalProcessingTime"], 1.5);
        assert_eq!(value["consensusLevel"], "StrongConsensus");

        let avg = result.average_model_confidence().unwrap();
        assert!((avg - 0.7).abs() < 1e-9);
        assert_eq!(result.model_count(), 3);
    }
}
