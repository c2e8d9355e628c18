//! Consensus request and the failure threshold policy

use crate::core::question::Question;
use serde::{Deserialize, Serialize};

/// Domain tag used when none is configured
pub const DEFAULT_DOMAIN: &str = "General";

/// Domain tag for which the theoretical-framework section is requested
const THEORETICAL_FRAMEWORK_DOMAIN: &str = "Psychology";

/// Smallest number of successful responses any run may synthesize from
const MINIMUM_AGENTS_FLOOR: usize = 3;

/// Minimum successful responses required for `model_count` configured models.
///
/// `max(3, floor(2 * n / 3))`: never fewer than three agents, and roughly a
/// two-thirds majority for larger model sets.
///
/// ```
/// use consensus_domain::minimum_agents_required;
///
/// assert_eq!(minimum_agents_required(3), 3);
/// assert_eq!(minimum_agents_required(6), 4);
/// assert_eq!(minimum_agents_required(10), 6);
/// ```
pub fn minimum_agents_required(model_count: usize) -> usize {
    MINIMUM_AGENTS_FLOOR.max(model_count * 2 / 3)
}

/// Request driving the divergent phase (Value Object)
///
/// Created once per run; the switches decide which sections the
/// divergent prompt asks every model for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusRequest {
    /// The prompt every model answers
    pub prompt: Question,
    /// Free-form domain tag (cosmetic except for the theoretical framework switch)
    pub domain: String,
    /// Ask models for a labeled reasoning section
    pub include_reasoning: bool,
    /// Ask models for a `<confidence>` tag
    pub include_confidence: bool,
    /// Ask models for the theoretical framework they rely on
    pub include_theoretical_framework: bool,
    /// Successful responses required before synthesis is attempted
    pub minimum_agents: usize,
}

impl ConsensusRequest {
    /// Create a request for `model_count` configured models with default switches.
    pub fn new(prompt: Question, model_count: usize) -> Self {
        Self {
            prompt,
            domain: DEFAULT_DOMAIN.to_string(),
            include_reasoning: true,
            include_confidence: true,
            include_theoretical_framework: false,
            minimum_agents: minimum_agents_required(model_count),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_reasoning(mut self, enabled: bool) -> Self {
        self.include_reasoning = enabled;
        self
    }

    pub fn with_confidence(mut self, enabled: bool) -> Self {
        self.include_confidence = enabled;
        self
    }

    pub fn with_theoretical_framework(mut self, enabled: bool) -> Self {
        self.include_theoretical_framework = enabled;
        self
    }

    /// Whether the theoretical framework section should actually be requested.
    ///
    /// Only honored for the Psychology domain.
    pub fn wants_theoretical_framework(&self) -> bool {
        self.include_theoretical_framework
            && self.domain.eq_ignore_ascii_case(THEORETICAL_FRAMEWORK_DOMAIN)
    }
}
