//! Run Consensus use case
//!
//! Orchestrates the full two-phase consensus flow:
//!
//! 1. Divergent collection from every model ([`CollectResponsesUseCase`])
//! 2. Persist the responses under the run id
//! 3. Judge synthesis ([`SynthesizeUseCase`]), retried after reloading the
//!    persisted responses when an attempt fails or times out

use crate::config::ConsensusParams;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::response_store::{ResponseStore, StoreError};
use crate::ports::run_logger::{NoRunLogger, RunLogger};
use crate::use_cases::collect_responses::CollectResponsesUseCase;
use crate::use_cases::synthesize::{SynthesisError, SynthesizeUseCase};
use consensus_domain::{
    ConsensusRequest, ConsensusResult, Model, ModelResponse, Phase, Question, RunId,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Errors that can occur during a consensus run
#[derive(Error, Debug)]
pub enum RunConsensusError {
    #[error("No models configured")]
    NoModels,

    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Only {received} of {total} models responded; at least {required} are required")]
    InsufficientResponses {
        received: usize,
        total: usize,
        required: usize,
    },

    #[error("No saved responses found for run {run_id} before synthesis attempt {attempt}")]
    StoreReloadEmpty { run_id: String, attempt: usize },

    #[error("Failed to reload responses for run {run_id}: {source}")]
    StoreReloadFailed {
        run_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Synthesis failed after {attempts} attempts: {source}")]
    SynthesisExhausted {
        attempts: usize,
        #[source]
        source: SynthesisError,
    },
}

/// Input for the RunConsensus use case
#[derive(Debug, Clone)]
pub struct RunConsensusInput {
    /// The prompt every model answers
    pub prompt: String,
    /// Participating models; the first one judges unless a judge is configured
    pub models: Vec<Model>,
    /// Run id; generated when absent
    pub run_id: Option<RunId>,
}

impl RunConsensusInput {
    pub fn new(prompt: impl Into<String>, models: Vec<Model>) -> Self {
        Self {
            prompt: prompt.into(),
            models,
            run_id: None,
        }
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }
}

/// Use case for running a consensus
pub struct RunConsensusUseCase<G: LlmGateway + 'static, S: ResponseStore + 'static> {
    gateway: Arc<G>,
    store: Arc<S>,
    logger: Arc<dyn RunLogger>,
    params: ConsensusParams,
}

impl<G: LlmGateway + 'static, S: ResponseStore + 'static> RunConsensusUseCase<G, S> {
    pub fn new(gateway: Arc<G>, store: Arc<S>, params: ConsensusParams) -> Self {
        Self {
            gateway,
            store,
            logger: Arc::new(NoRunLogger),
            params,
        }
    }

    /// Set the run logger
    pub fn with_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: RunConsensusInput,
    ) -> Result<ConsensusResult, RunConsensusError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunConsensusInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<ConsensusResult, RunConsensusError> {
        if input.models.is_empty() {
            return Err(RunConsensusError::NoModels);
        }
        let question = Question::try_new(input.prompt).ok_or(RunConsensusError::EmptyPrompt)?;
        let models = input.models;
        let run_id = input.run_id.unwrap_or_else(RunId::generate);
        let started = Instant::now();

        let request = ConsensusRequest::new(question, models.len())
            .with_domain(self.params.domain.clone())
            .with_reasoning(self.params.include_reasoning)
            .with_confidence(self.params.include_confidence)
            .with_theoretical_framework(self.params.include_theoretical_framework);
        let required = request.minimum_agents;

        info!(
            "Starting consensus run {} with {} models (minimum {})",
            run_id,
            models.len(),
            required
        );
        self.logger.info(
            &run_id,
            &format!(
                "Run started with {} models, {} responses required, domain {}",
                models.len(),
                required,
                request.domain
            ),
        );

        // Phase 1: Divergent collection
        let collector = CollectResponsesUseCase::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.logger),
            self.params.agent_timeout,
        );
        let collected = collector
            .collect_with_progress(&request, &models, &run_id, progress)
            .await;

        let received = collected.responses.len();
        if received < required {
            error!(
                "Only {} of {} models responded; {} required",
                received,
                models.len(),
                required
            );
            self.logger.error(
                &run_id,
                &format!(
                    "Insufficient responses: {} of {} ({} required)",
                    received,
                    models.len(),
                    required
                ),
            );
            return Err(RunConsensusError::InsufficientResponses {
                received,
                total: models.len(),
                required,
            });
        }

        if let Err(e) = self.store.save(run_id.as_str(), &collected.responses).await {
            warn!("Failed to save responses for run {}: {}", run_id, e);
            self.logger
                .warn(&run_id, &format!("Failed to save responses: {}", e));
        }

        // Phase 2: Synthesis with retry-and-reload
        let judge = self
            .params
            .judge
            .clone()
            .unwrap_or_else(|| models[0].clone());
        let judge_timeout = self.params.judge_timeout();
        let synthesizer = SynthesizeUseCase::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.logger),
            judge_timeout,
            self.params.heartbeat_interval,
        );
        let max_attempts = self.params.max_synthesis_attempts.max(1);
        let prompt = request.prompt.content();

        let answered: Vec<Model> = models
            .iter()
            .filter(|m| collected.responses.iter().any(|r| r.model_name == m.as_str()))
            .cloned()
            .collect();

        progress.on_phase_start(&Phase::Synthesis, 1);
        let mut responses = collected.responses;
        let mut attempt = 1;

        loop {
            let outcome = tokio::time::timeout(
                judge_timeout,
                synthesizer.synthesize(prompt, &responses, &judge, &run_id),
            )
            .await
            .unwrap_or(Err(SynthesisError::Timeout(judge_timeout)));

            let error = match outcome {
                Ok(mut result) => {
                    progress.on_task_complete(&Phase::Synthesis, &judge, true);
                    progress.on_phase_complete(&Phase::Synthesis);

                    result.individual_responses = responses;
                    result.total_processing_time = started.elapsed();
                    result.run_id = run_id.to_string();

                    info!(
                        "Consensus run {} complete in {:.1}s: {}",
                        run_id,
                        result.total_processing_time.as_secs_f64(),
                        result.consensus_level
                    );
                    self.logger.info(
                        &run_id,
                        &format!(
                            "Run complete in {:.1}s: {}, confidence {:.0}%",
                            result.total_processing_time.as_secs_f64(),
                            result.consensus_level,
                            result.overall_confidence * 100.0
                        ),
                    );
                    return Ok(result);
                }
                Err(e) => e,
            };

            warn!(
                "Synthesis attempt {}/{} failed: {}",
                attempt, max_attempts, error
            );
            self.logger.warn(
                &run_id,
                &format!("Synthesis attempt {}/{} failed: {}", attempt, max_attempts, error),
            );

            if attempt >= max_attempts {
                progress.on_task_complete(&Phase::Synthesis, &judge, false);
                progress.on_phase_complete(&Phase::Synthesis);
                self.logger.error(
                    &run_id,
                    &format!("Synthesis failed after {} attempts", attempt),
                );
                return Err(RunConsensusError::SynthesisExhausted {
                    attempts: attempt,
                    source: error,
                });
            }

            attempt += 1;
            progress.on_synthesis_retry(attempt, max_attempts);
            responses = match self.reload(&run_id, &models, &answered, attempt, required).await {
                Ok(reloaded) => reloaded,
                Err(e) => {
                    progress.on_task_complete(&Phase::Synthesis, &judge, false);
                    progress.on_phase_complete(&Phase::Synthesis);
                    return Err(e);
                }
            };
        }
    }

    /// Reload the saved responses before a retry, in model order.
    ///
    /// Only records from models that answered in this run's phase 1 are kept;
    /// a reused run id may leave older files in the same directory.
    async fn reload(
        &self,
        run_id: &RunId,
        models: &[Model],
        answered: &[Model],
        attempt: usize,
        required: usize,
    ) -> Result<Vec<ModelResponse>, RunConsensusError> {
        let mut responses = self
            .store
            .load(run_id.as_str())
            .await
            .map_err(|source| RunConsensusError::StoreReloadFailed {
                run_id: run_id.to_string(),
                source,
            })?;

        let found = responses.len();
        responses.retain(|r| answered.iter().any(|m| m.as_str() == r.model_name));
        if responses.len() < found {
            warn!(
                "Ignored {} saved responses not produced by run {}",
                found - responses.len(),
                run_id
            );
            self.logger.warn(
                run_id,
                &format!("Ignored {} stale saved responses", found - responses.len()),
            );
        }

        if responses.is_empty() {
            self.logger
                .error(run_id, "Reload before retry found no saved responses");
            return Err(RunConsensusError::StoreReloadEmpty {
                run_id: run_id.to_string(),
                attempt,
            });
        }
        if responses.len() < required {
            return Err(RunConsensusError::InsufficientResponses {
                received: responses.len(),
                total: models.len(),
                required,
            });
        }

        responses.sort_by_key(|r| {
            models
                .iter()
                .position(|m| m.as_str() == r.model_name)
                .unwrap_or(models.len())
        });
        self.logger.info(
            run_id,
            &format!("Reloaded {} responses for attempt {}", responses.len(), attempt),
        );
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::GatewayError;
    use async_trait::async_trait;
    use consensus_domain::{ConsensusLevel, Message};
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // ==================== Test Mocks ====================

    #[derive(Clone)]
    enum Scripted {
        Reply { delay_secs: u64, text: String },
        Fail(GatewayError),
    }

    fn reply(delay_secs: u64, text: &str) -> Scripted {
        Scripted::Reply {
            delay_secs,
            text: text.to_string(),
        }
    }

    /// Divergent replies keyed by model; judge replies in a queue.
    struct MockGateway {
        divergent: Mutex<HashMap<String, Scripted>>,
        judge: Mutex<VecDeque<Scripted>>,
        judge_calls: AtomicUsize,
    }

    impl MockGateway {
        fn new(divergent: Vec<(&str, Scripted)>, judge: Vec<Scripted>) -> Self {
            Self {
                divergent: Mutex::new(
                    divergent
                        .into_iter()
                        .map(|(m, s)| (m.to_string(), s))
                        .collect(),
                ),
                judge: Mutex::new(VecDeque::from(judge)),
                judge_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmGateway for MockGateway {
        async fn query(
            &self,
            model: &Model,
            messages: &[Message],
            _timeout: Duration,
        ) -> Result<String, GatewayError> {
            let is_judge = messages
                .first()
                .is_some_and(|m| m.content.contains("synthesis judge"));
            let script = if is_judge {
                self.judge_calls.fetch_add(1, Ordering::SeqCst);
                self.judge.lock().unwrap().pop_front()
            } else {
                self.divergent.lock().unwrap().remove(model.as_str())
            }
            .ok_or_else(|| GatewayError::Other("No more responses".to_string()))?;

            match script {
                Scripted::Reply { delay_secs, text } => {
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                    Ok(text)
                }
                Scripted::Fail(e) => Err(e),
            }
        }
    }

    /// In-memory store counting loads; `drop_on_save` simulates a lost write.
    #[derive(Default)]
    struct MockStore {
        saved: Mutex<HashMap<String, Vec<ModelResponse>>>,
        loads: AtomicUsize,
        drop_on_save: bool,
        fail_save: bool,
        /// Records left behind by an earlier run with the same id
        leftovers: Vec<ModelResponse>,
    }

    #[async_trait]
    impl ResponseStore for MockStore {
        async fn save(&self, run_id: &str, responses: &[ModelResponse]) -> Result<(), StoreError> {
            if self.fail_save {
                return Err(StoreError::Serialization("disk full".to_string()));
            }
            if !self.drop_on_save {
                // reversed to prove the orchestrator restores model order
                let mut reversed = responses.to_vec();
                reversed.reverse();
                self.saved.lock().unwrap().insert(run_id.to_string(), reversed);
            }
            Ok(())
        }

        async fn load(&self, run_id: &str) -> Result<Vec<ModelResponse>, StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let mut loaded = self
                .saved
                .lock()
                .unwrap()
                .get(run_id)
                .cloned()
                .unwrap_or_default();
            loaded.extend(self.leftovers.iter().cloned());
            Ok(loaded)
        }

        async fn exists(&self, run_id: &str) -> Result<bool, StoreError> {
            Ok(self.saved.lock().unwrap().contains_key(run_id))
        }
    }

    const VERDICT: &str = "<synthesis><synthesized_answer>Paris is correct</synthesized_answer>\
        <confidence>85</confidence><consensus_level>Strong</consensus_level></synthesis>";

    fn three_models() -> Vec<Model> {
        vec![Model::new("a"), Model::new("b"), Model::new("c")]
    }

    fn answering(models: &[&'static str]) -> Vec<(&'static str, Scripted)> {
        models.iter().map(|m| (*m, reply(1, "Paris"))).collect()
    }

    fn params() -> ConsensusParams {
        ConsensusParams::default().with_agent_timeout(Duration::from_secs(60))
    }

    fn use_case(
        gateway: MockGateway,
        store: MockStore,
    ) -> (
        RunConsensusUseCase<MockGateway, MockStore>,
        Arc<MockGateway>,
        Arc<MockStore>,
    ) {
        let gateway = Arc::new(gateway);
        let store = Arc::new(store);
        let use_case = RunConsensusUseCase::new(Arc::clone(&gateway), Arc::clone(&store), params());
        (use_case, gateway, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path() {
        let gateway = MockGateway::new(answering(&["a", "b", "c"]), vec![reply(5, VERDICT)]);
        let (use_case, gateway, store) = use_case(gateway, MockStore::default());

        let run_id = RunId::parse("happy").unwrap();
        let result = use_case
            .execute(RunConsensusInput::new("Capital of France?", three_models()).with_run_id(run_id))
            .await
            .unwrap();

        assert_eq!(result.synthesized_answer, "Paris is correct");
        assert_eq!(result.overall_confidence, 0.85);
        assert_eq!(result.consensus_level, ConsensusLevel::StrongConsensus);
        assert_eq!(result.individual_responses.len(), 3);
        assert_eq!(result.run_id, "happy");
        assert_eq!(result.judge_model, "a");
        assert!(result.total_processing_time >= Duration::from_secs(6));
        assert_eq!(gateway.judge_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
        assert!(store.exists("happy").await.unwrap());
    }

    #[tokio::test]
    async fn test_no_models() {
        let (use_case, _, _) = use_case(MockGateway::new(vec![], vec![]), MockStore::default());
        let err = use_case
            .execute(RunConsensusInput::new("Q", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, RunConsensusError::NoModels));
    }

    #[tokio::test]
    async fn test_empty_prompt() {
        let (use_case, _, _) = use_case(MockGateway::new(vec![], vec![]), MockStore::default());
        let err = use_case
            .execute(RunConsensusInput::new("   ", three_models()))
            .await
            .unwrap_err();
        assert!(matches!(err, RunConsensusError::EmptyPrompt));
    }

    #[tokio::test(start_paused = true)]
    async fn test_below_threshold_never_queries_judge() {
        let gateway = MockGateway::new(
            vec![
                ("a", reply(1, "Paris")),
                ("b", reply(1, "Paris")),
                ("c", Scripted::Fail(GatewayError::Connection("refused".to_string()))),
            ],
            vec![reply(1, VERDICT)],
        );
        let (use_case, gateway, _) = use_case(gateway, MockStore::default());

        let err = use_case
            .execute(RunConsensusInput::new("Q", three_models()))
            .await
            .unwrap_err();

        match err {
            RunConsensusError::InsufficientResponses {
                received,
                total,
                required,
            } => {
                assert_eq!((received, total, required), (2, 3, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gateway.judge_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_preserved_under_shuffled_latencies() {
        let gateway = MockGateway::new(
            vec![
                ("a", reply(40, "A")),
                ("b", reply(2, "B")),
                ("c", reply(20, "C")),
                ("d", reply(9, "D")),
            ],
            vec![reply(1, VERDICT)],
        );
        let (use_case, _, _) = use_case(gateway, MockStore::default());
        let models = vec![Model::new("a"), Model::new("b"), Model::new("c"), Model::new("d")];

        let result = use_case
            .execute(RunConsensusInput::new("Q", models))
            .await
            .unwrap();
        let names: Vec<&str> = result
            .individual_responses
            .iter()
            .map(|r| r.model_name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_reloads_and_restores_order() {
        let gateway = MockGateway::new(
            answering(&["a", "b", "c"]),
            vec![
                Scripted::Fail(GatewayError::Status {
                    status: 500,
                    body: "oops".to_string(),
                }),
                reply(1, VERDICT),
            ],
        );
        let (use_case, gateway, store) = use_case(gateway, MockStore::default());

        let result = use_case
            .execute(RunConsensusInput::new("Q", three_models()))
            .await
            .unwrap();
        assert_eq!(gateway.judge_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        let names: Vec<&str> = result
            .individual_responses
            .iter()
            .map(|r| r.model_name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reused_run_id_ignores_stale_records_on_retry() {
        let gateway = MockGateway::new(
            vec![
                ("a", reply(1, "A")),
                ("b", reply(1, "B")),
                ("c", reply(1, "C")),
                ("d", Scripted::Fail(GatewayError::Connection("refused".to_string()))),
            ],
            vec![Scripted::Fail(GatewayError::Timeout), reply(1, VERDICT)],
        );
        let store = MockStore {
            leftovers: vec![ModelResponse::new(
                "d",
                "Answer from an earlier run",
                chrono::Utc::now(),
            )],
            ..MockStore::default()
        };
        let (use_case, gateway, store) = use_case(gateway, store);
        let models = vec![Model::new("a"), Model::new("b"), Model::new("c"), Model::new("d")];

        let result = use_case
            .execute(RunConsensusInput::new("Q", models).with_run_id(RunId::parse("job-7").unwrap()))
            .await
            .unwrap();

        assert_eq!(gateway.judge_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        let names: Vec<&str> = result
            .individual_responses
            .iter()
            .map(|r| r.model_name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_exhaust_attempts() {
        let failures = (1..=3)
            .map(|i| Scripted::Fail(GatewayError::Other(format!("failure {i}"))))
            .collect();
        let gateway = MockGateway::new(answering(&["a", "b", "c"]), failures);
        let (use_case, gateway, store) = use_case(gateway, MockStore::default());

        let err = use_case
            .execute(RunConsensusInput::new("Q", three_models()))
            .await
            .unwrap_err();

        match err {
            RunConsensusError::SynthesisExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert_eq!(
                    source,
                    SynthesisError::Gateway(GatewayError::Other("failure 3".to_string()))
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gateway.judge_calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_judge_timeout_is_retried() {
        // judge timeout = 4 x 60s
        let gateway = MockGateway::new(
            answering(&["a", "b", "c"]),
            vec![reply(1000, VERDICT), reply(1, VERDICT)],
        );
        let (use_case, gateway, store) = use_case(gateway, MockStore::default());

        let result = use_case
            .execute(RunConsensusInput::new("Q", three_models()))
            .await
            .unwrap();
        assert_eq!(result.synthesized_answer, "Paris is correct");
        assert_eq!(gateway.judge_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        assert!(result.total_processing_time >= Duration::from_secs(240));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_reload_is_fatal() {
        let gateway = MockGateway::new(
            answering(&["a", "b", "c"]),
            vec![Scripted::Fail(GatewayError::Timeout), reply(1, VERDICT)],
        );
        let store = MockStore {
            drop_on_save: true,
            ..MockStore::default()
        };
        let (use_case, gateway, _) = use_case(gateway, store);

        let err = use_case
            .execute(RunConsensusInput::new("Q", three_models()).with_run_id(RunId::parse("lost").unwrap()))
            .await
            .unwrap_err();
        match err {
            RunConsensusError::StoreReloadEmpty { run_id, attempt } => {
                assert_eq!(run_id, "lost");
                assert_eq!(attempt, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gateway.judge_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_failure_does_not_abort_first_attempt() {
        let gateway = MockGateway::new(answering(&["a", "b", "c"]), vec![reply(1, VERDICT)]);
        let store = MockStore {
            fail_save: true,
            ..MockStore::default()
        };
        let (use_case, _, _) = use_case(gateway, store);

        let result = use_case
            .execute(RunConsensusInput::new("Q", three_models()))
            .await
            .unwrap();
        assert_eq!(result.individual_responses.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_judge_overrides_first_model() {
        let gateway = Arc::new(MockGateway::new(
            answering(&["a", "b", "c"]),
            vec![reply(1, VERDICT)],
        ));
        let use_case = RunConsensusUseCase::new(
            Arc::clone(&gateway),
            Arc::new(MockStore::default()),
            params().with_judge(Some(Model::new("judge-x"))),
        );
        let result = use_case
            .execute(RunConsensusInput::new("Q", three_models()))
            .await
            .unwrap();
        assert_eq!(result.judge_model, "judge-x");
    }

    #[test]
    fn test_error_messages() {
        let err = RunConsensusError::InsufficientResponses {
            received: 2,
            total: 5,
            required: 3,
        };
        assert_eq!(
            err.to_string(),
            "Only 2 of 5 models responded; at least 3 are required"
        );
    }
}
