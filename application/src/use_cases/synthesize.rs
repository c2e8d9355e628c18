//! Synthesize use case
//!
//! Phase 2 of a consensus run: one judge model reconciles the collected
//! responses into a single verdict.

use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::run_logger::RunLogger;
use consensus_domain::{
    ConsensusResult, Message, Model, ModelResponse, PromptTemplate, RunId, parse_synthesis,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from a single synthesis attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Judge query failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Synthesis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Judge returned an empty response")]
    EmptyResponse,
}

/// Shortest heartbeat period; `tokio::time::interval` rejects zero.
const MIN_HEARTBEAT: Duration = Duration::from_millis(100);

/// Use case for one judge synthesis attempt
pub struct SynthesizeUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    logger: Arc<dyn RunLogger>,
    query_timeout: Duration,
    heartbeat_interval: Duration,
}

impl<G: LlmGateway + 'static> SynthesizeUseCase<G> {
    pub fn new(
        gateway: Arc<G>,
        logger: Arc<dyn RunLogger>,
        query_timeout: Duration,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            gateway,
            logger,
            query_timeout,
            heartbeat_interval: heartbeat_interval.max(MIN_HEARTBEAT),
        }
    }

    /// Ask `judge` to synthesize `responses` and parse its verdict.
    ///
    /// While the judge is working a heartbeat line goes to the run log every
    /// `heartbeat_interval`. Gateway failures propagate; parsing never fails.
    pub async fn synthesize(
        &self,
        prompt: &str,
        responses: &[ModelResponse],
        judge: &Model,
        run_id: &RunId,
    ) -> Result<ConsensusResult, SynthesisError> {
        info!("Phase 2: Synthesis by {} over {} responses", judge, responses.len());
        self.logger.info(
            run_id,
            &format!("Phase 2: {} synthesizing {} responses", judge, responses.len()),
        );

        let messages = [
            Message::system(PromptTemplate::judge_system()),
            Message::user(PromptTemplate::judge_prompt(prompt, responses)),
        ];

        let started = tokio::time::Instant::now();
        let query = self.gateway.query(judge, &messages, self.query_timeout);
        tokio::pin!(query);

        let mut heartbeat = tokio::time::interval_at(
            started + self.heartbeat_interval,
            self.heartbeat_interval,
        );

        let raw = loop {
            tokio::select! {
                result = &mut query => break result?,
                _ = heartbeat.tick() => {
                    self.logger.info(
                        run_id,
                        &format!(
                            "{} still synthesizing ({}s elapsed)",
                            judge,
                            started.elapsed().as_secs()
                        ),
                    );
                }
            }
        };

        if raw.trim().is_empty() {
            return Err(SynthesisError::EmptyResponse);
        }

        let parsed = parse_synthesis(&raw);
        debug!("Judge output decoded as {}", parsed.format);
        self.logger.info(
            run_id,
            &format!(
                "Synthesis complete in {:.1}s ({} format, {} consensus)",
                started.elapsed().as_secs_f64(),
                parsed.format,
                parsed.consensus_level
            ),
        );

        Ok(parsed.into_result(prompt, responses.to_vec(), judge.as_str(), run_id.as_str()))
    }
}
