//! Consensus parameters: run control for the two-phase pipeline.
//!
//! [`ConsensusParams`] groups the static parameters that control
//! [`RunConsensusUseCase`](crate::use_cases::run_consensus::RunConsensusUseCase).
//! The infrastructure config layer builds one from file, environment and
//! CLI values.

use consensus_domain::{DEFAULT_DOMAIN, Model};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The judge gets this many per-agent timeouts for one synthesis attempt.
const JUDGE_TIMEOUT_FACTOR: u32 = 4;

/// Run control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Deadline for each model in the divergent phase.
    pub agent_timeout: Duration,
    /// Total synthesis attempts, the first included.
    pub max_synthesis_attempts: usize,
    /// Interval between "still synthesizing" run log lines.
    pub heartbeat_interval: Duration,
    /// Domain tag for the request.
    pub domain: String,
    /// Judge model; the first configured model when unset.
    pub judge: Option<Model>,
    pub include_reasoning: bool,
    pub include_confidence: bool,
    pub include_theoretical_framework: bool,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(120),
            max_synthesis_attempts: 3,
            heartbeat_interval: Duration::from_secs(15),
            domain: DEFAULT_DOMAIN.to_string(),
            judge: None,
            include_reasoning: true,
            include_confidence: true,
            include_theoretical_framework: false,
        }
    }
}

impl ConsensusParams {
    /// Deadline for one synthesis attempt
    pub fn judge_timeout(&self) -> Duration {
        self.agent_timeout * JUDGE_TIMEOUT_FACTOR
    }

    // ==================== Builder Methods ====================

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_max_synthesis_attempts(mut self, attempts: usize) -> Self {
        self.max_synthesis_attempts = attempts;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_judge(mut self, judge: Option<Model>) -> Self {
        self.judge = judge;
        self
    }

    pub fn with_theoretical_framework(mut self, enabled: bool) -> Self {
        self.include_theoretical_framework = enabled;
        self
    }
}
