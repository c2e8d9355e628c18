//! Collect Responses use case
//!
//! Phase 1 of a consensus run: every model answers the same prompt in
//! parallel, each under its own deadline.

use crate::ports::llm_gateway::{GatewayError, LlmGateway};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_logger::RunLogger;
use chrono::Utc;
use consensus_domain::{
    ConsensusRequest, Message, Model, ModelResponse, Phase, PromptTemplate, RunId,
    parse_model_response,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How one model fared in the divergent phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome {
    Succeeded,
    TimedOut,
    Failed(String),
}

/// Per-model outcome counts of one collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionReport {
    pub succeeded: usize,
    pub timed_out: usize,
    pub failed: usize,
}

impl CollectionReport {
    fn record(&mut self, outcome: &ModelOutcome) {
        match outcome {
            ModelOutcome::Succeeded => self.succeeded += 1,
            ModelOutcome::TimedOut => self.timed_out += 1,
            ModelOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.timed_out + self.failed
    }
}

impl std::fmt::Display for CollectionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} succeeded, {} timed out, {} failed",
            self.succeeded, self.timed_out, self.failed
        )
    }
}

/// Output of the divergent phase
#[derive(Debug, Clone)]
pub struct CollectionOutput {
    /// Successful responses, in the order the models were given
    pub responses: Vec<ModelResponse>,
    pub report: CollectionReport,
}

/// Use case for querying every model in parallel
pub struct CollectResponsesUseCase<G: LlmGateway + 'static> {
    gateway: Arc<G>,
    logger: Arc<dyn RunLogger>,
    agent_timeout: Duration,
}

impl<G: LlmGateway + 'static> CollectResponsesUseCase<G> {
    pub fn new(gateway: Arc<G>, logger: Arc<dyn RunLogger>, agent_timeout: Duration) -> Self {
        Self {
            gateway,
            logger,
            agent_timeout,
        }
    }

    /// Collect with default (no-op) progress
    pub async fn collect(
        &self,
        request: &ConsensusRequest,
        models: &[Model],
        run_id: &RunId,
    ) -> CollectionOutput {
        self.collect_with_progress(request, models, run_id, &NoProgress)
            .await
    }

    /// Collect with progress callbacks.
    ///
    /// Never fails: a model that errors, times out or panics is dropped from
    /// the output and counted in the report. Waits for every model.
    pub async fn collect_with_progress(
        &self,
        request: &ConsensusRequest,
        models: &[Model],
        run_id: &RunId,
        progress: &dyn ProgressNotifier,
    ) -> CollectionOutput {
        info!("Phase 1: Divergent collection from {} models", models.len());
        progress.on_phase_start(&Phase::Divergent, models.len());
        self.logger.info(
            run_id,
            &format!(
                "Phase 1: querying {} models (timeout {}s each)",
                models.len(),
                self.agent_timeout.as_secs()
            ),
        );

        let messages = Arc::new(vec![
            Message::system(PromptTemplate::divergent_system()),
            Message::user(PromptTemplate::divergent_prompt(request)),
        ]);

        let mut join_set = JoinSet::new();

        for (index, model) in models.iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            let messages = Arc::clone(&messages);
            let model = model.clone();
            let timeout = self.agent_timeout;

            join_set.spawn(async move {
                let started = Instant::now();
                let query = gateway.query(&model, &messages, timeout);
                let result = tokio::time::timeout(timeout, query)
                    .await
                    .unwrap_or(Err(GatewayError::Timeout));
                (index, model, started.elapsed(), result)
            });
        }

        let mut slots: Vec<Option<ModelResponse>> = vec![None; models.len()];
        let mut report = CollectionReport::default();

        while let Some(joined) = join_set.join_next().await {
            let (index, model, elapsed, result) = match joined {
                Ok(output) => output,
                Err(e) => {
                    warn!("Task join error: {}", e);
                    report.record(&ModelOutcome::Failed(e.to_string()));
                    continue;
                }
            };

            let outcome = match result {
                Ok(raw) if raw.trim().is_empty() => {
                    ModelOutcome::Failed(GatewayError::EmptyResponse.to_string())
                }
                Ok(raw) => {
                    let response = parse_model_response(model.as_str(), &raw, Utc::now());
                    debug!(
                        "Model {} confidence {:.2}, {} chars",
                        model,
                        response.confidence_score,
                        response.answer.len()
                    );
                    slots[index] = Some(response);
                    ModelOutcome::Succeeded
                }
                Err(e) if e.is_timeout() => ModelOutcome::TimedOut,
                Err(e) => ModelOutcome::Failed(e.to_string()),
            };

            match &outcome {
                ModelOutcome::Succeeded => {
                    info!("Model {} responded in {:.1}s", model, elapsed.as_secs_f64());
                    self.logger.info(
                        run_id,
                        &format!("{} responded in {:.1}s", model, elapsed.as_secs_f64()),
                    );
                }
                ModelOutcome::TimedOut => {
                    warn!("Model {} timed out", model);
                    self.logger.warn(
                        run_id,
                        &format!("{} timed out after {}s", model, self.agent_timeout.as_secs()),
                    );
                }
                ModelOutcome::Failed(reason) => {
                    warn!("Model {} failed: {}", model, reason);
                    self.logger
                        .warn(run_id, &format!("{} failed: {}", model, reason));
                }
            }

            report.record(&outcome);
            progress.on_task_complete(&Phase::Divergent, &model, outcome == ModelOutcome::Succeeded);
        }

        progress.on_phase_complete(&Phase::Divergent);
        info!("Phase 1 complete: {}", report);
        self.logger
            .info(run_id, &format!("Phase 1 complete: {}", report));

        CollectionOutput {
            responses: slots.into_iter().flatten().collect(),
            report,
        }
    }
}
