//! @ai:module:intent Drives a dataset through both models and the judge, committing statistics per case
//! @ai:module:layer application
//! @ai:module:public_api Orchestrator, ModelSlot
//! @ai:module:stateless false

use crate::capability::{capability_by_name, normalize_name, CapabilityKind};
use crate::config::{BenchmarkConfig, DomainConfig, ModelConfig, RunSettings};
use crate::dataset::TestCase;
use crate::error::{BenchError, ConfigError, GatewayError, Stage};
use crate::gateway::{ChatMessage, Completion, ModelGateway, SamplingParams};
use crate::judge::JudgeProtocol;
use crate::metrics::{
    CaseFailure, CaseResult, ConfigSummary, ModelResponse, RunResult, StatsAccumulator,
};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// @ai:intent A compared model: its settings and the gateway that serves it
pub struct ModelSlot<G: ModelGateway> {
    pub config: ModelConfig,
    pub gateway: Arc<G>,
    name: String,
}

impl<G: ModelGateway> ModelSlot<G> {
    pub fn new(config: ModelConfig, gateway: Arc<G>) -> Self {
        let name = config.identity().display_name();
        Self {
            config,
            gateway,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

/// @ai:intent Runs pairwise comparisons for a dataset and assembles the RunResult
pub struct Orchestrator<G: ModelGateway, J: ModelGateway> {
    model_a: ModelSlot<G>,
    model_b: ModelSlot<G>,
    judge: JudgeProtocol<J>,
    capabilities: Vec<(String, CapabilityKind)>,
    domain: DomainConfig,
    settings: RunSettings,
    name: String,
    config_summary: ConfigSummary,
    include_raw_responses: bool,
    cancel: Arc<AtomicBool>,
}

impl<G: ModelGateway, J: ModelGateway> Orchestrator<G, J> {
    /// @ai:intent Validate the configuration and bind the two model gateways
    /// @ai:pre config.models has exactly two entries, in A, B order
    /// @ai:effects pure
    pub fn new(
        config: &BenchmarkConfig,
        gateway_a: Arc<G>,
        gateway_b: Arc<G>,
        judge: JudgeProtocol<J>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let capabilities = config
            .capabilities
            .iter()
            .map(|name| Ok((normalize_name(name), capability_by_name(name)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            model_a: ModelSlot::new(config.models[0].clone(), gateway_a),
            model_b: ModelSlot::new(config.models[1].clone(), gateway_b),
            judge,
            capabilities,
            domain: config.domain.clone(),
            settings: config.settings.clone(),
            name: config.name.clone(),
            config_summary: ConfigSummary::from_config(config),
            include_raw_responses: config.output.include_raw_responses,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// @ai:intent Share an externally owned cancel flag (e.g. set on Ctrl-C)
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// @ai:intent Judge every case on every capability and reduce the statistics
    /// @ai:pre dataset cases are unique by id
    /// @ai:post results appear in dataset order; a failed case contributes nothing to statistics
    /// @ai:effects network, time
    pub async fn run(&self, dataset: &[TestCase]) -> Result<RunResult, BenchError> {
        for case in dataset {
            for (_, kind) in &self.capabilities {
                kind.capability().validate(case)?;
            }
        }

        let started_at = Utc::now();
        let clock = Instant::now();
        let total = dataset.len();
        let concurrency = self.settings.concurrency.max(1);
        let delay = self.settings.sleep_duration();

        tracing::info!(
            "Running {} test cases: {} vs {} (judge {}, concurrency {})",
            total,
            self.model_a.name(),
            self.model_b.name(),
            self.judge.model(),
            concurrency
        );

        let capability_names: Vec<String> =
            self.capabilities.iter().map(|(name, _)| name.clone()).collect();
        let mut stats =
            StatsAccumulator::new(self.model_a.name(), self.model_b.name(), &capability_names);
        let mut results = Vec::new();
        let mut failures = Vec::new();

        // Delay runs before a case enters the buffer, spacing case starts at any concurrency.
        let cancel = Arc::clone(&self.cancel);
        let mut outcomes = std::pin::pin!(stream::iter(dataset.iter().enumerate())
            .then(move |(index, case)| async move {
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                case
            })
            .take_while(move |_| futures::future::ready(!cancel.load(Ordering::SeqCst)))
            .map(|case| async move { (case, self.run_case(case).await) })
            .buffered(concurrency));

        let mut processed = 0;
        while let Some((case, outcome)) = outcomes.next().await {
            processed += 1;
            match outcome {
                Ok(case_results) => {
                    tracing::info!(
                        "[{}/{}] {} ({}): {}",
                        processed,
                        total,
                        case.id,
                        case.category,
                        case_results
                            .iter()
                            .map(|r| format!("{}={}", r.capability, r.winner_name()))
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    stats.commit_case(&case_results);
                    results.extend(case_results);
                }
                Err(BenchError::CaseFailed {
                    case_id,
                    capability,
                    stage,
                    model,
                    source,
                }) if !self.settings.fail_fast => {
                    tracing::error!(
                        "[{}/{}] {} skipped: {} call to {} failed: {}",
                        processed,
                        total,
                        case_id,
                        stage,
                        model,
                        source
                    );
                    failures.push(CaseFailure {
                        case_id,
                        capability,
                        stage,
                        model,
                        error: source.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if processed < total {
            tracing::warn!("Run cancelled after {} of {} test cases", processed, total);
        }

        let summary = stats.summarize();
        Ok(RunResult {
            run_id: Uuid::new_v4(),
            name: self.name.clone(),
            started_at,
            duration_seconds: clock.elapsed().as_secs_f64(),
            config: self.config_summary.clone(),
            summary,
            results: if self.include_raw_responses {
                results
            } else {
                Vec::new()
            },
            failures,
        })
    }

    /// @ai:intent Every capability of one case, all or nothing
    /// @ai:post Err names the case, capability, stage and model of the first failed call
    /// @ai:effects network
    async fn run_case(&self, case: &TestCase) -> Result<Vec<CaseResult>, BenchError> {
        let mut case_results = Vec::with_capacity(self.capabilities.len());

        for (capability_name, kind) in &self.capabilities {
            let messages = kind
                .capability()
                .build_messages(case, &self.domain.system_prompt);

            let (reply_a, reply_b) = tokio::join!(
                Self::call_model(&self.model_a, &messages),
                Self::call_model(&self.model_b, &messages),
            );

            let failed = |stage: Stage, model: &str, source: GatewayError| BenchError::CaseFailed {
                case_id: case.id.clone(),
                capability: capability_name.clone(),
                stage,
                model: model.to_string(),
                source,
            };

            let (completion_a, latency_a) =
                reply_a.map_err(|e| failed(Stage::ModelA, self.model_a.name(), e))?;
            let (completion_b, latency_b) =
                reply_b.map_err(|e| failed(Stage::ModelB, self.model_b.name(), e))?;

            let verdict = self
                .judge
                .evaluate_pair(
                    &case.turns,
                    &completion_a.content,
                    &completion_b.content,
                    &self.domain.role,
                )
                .await
                .map_err(|e| failed(Stage::Judge, self.judge.model(), e))?;

            tracing::debug!(
                "{} / {}: direct={} swapped={} final={}",
                case.id,
                capability_name,
                verdict.raw_direct.winner,
                verdict.raw_swapped.winner,
                verdict.winner
            );

            case_results.push(CaseResult {
                test_id: case.id.clone(),
                category: case.category.clone(),
                capability: capability_name.clone(),
                turns: case.turns.clone(),
                model_a: ModelResponse {
                    model: self.model_a.name().to_string(),
                    response: completion_a.content,
                    latency_ms: latency_a,
                    tokens: completion_a.usage.total_tokens,
                    score: verdict.score_a,
                },
                model_b: ModelResponse {
                    model: self.model_b.name().to_string(),
                    response: completion_b.content,
                    latency_ms: latency_b,
                    tokens: completion_b.usage.total_tokens,
                    score: verdict.score_b,
                },
                verdict,
                timestamp: Utc::now(),
            });
        }

        Ok(case_results)
    }

    /// @ai:intent One timed gateway call
    /// @ai:effects network, time
    async fn call_model(
        slot: &ModelSlot<G>,
        messages: &[ChatMessage],
    ) -> Result<(Completion, f64), GatewayError> {
        let start = Instant::now();
        let completion = slot
            .gateway
            .generate(&slot.config.model, messages, &slot.params())
            .await?;
        Ok((completion, start.elapsed().as_secs_f64() * 1000.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::gateway::ScriptedGateway;
    use crate::judge::Winner;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const SAFE: &str = "The grilled fish is prepared in a nut-free area.";
    const RISKY: &str = "Try the satay, everyone loves it!";

    fn config() -> BenchmarkConfig {
        let mut config = BenchmarkConfig {
            name: "waiter-test".to_string(),
            models: vec![
                ModelConfig::new(ProviderKind::OpenAi, "model-a"),
                ModelConfig::new(ProviderKind::Anthropic, "model-b"),
            ],
            ..Default::default()
        };
        config.settings.sleep_between_calls = 0.0;
        config.domain.system_prompt = "You are a restaurant waiter.".to_string();
        config.domain.role = "a restaurant waiter".to_string();
        config
    }

    fn dataset(ids: &[&str]) -> Vec<TestCase> {
        ids.iter()
            .map(|id| {
                TestCase::new(
                    *id,
                    if id.ends_with('1') { "allergy" } else { "menu" },
                    vec![format!("[{}] I have a peanut allergy, what's safe?", id)],
                )
            })
            .collect()
    }

    fn last_user_turn(messages: &[ChatMessage]) -> &str {
        messages.last().map(|m| m.content.as_str()).unwrap_or_default()
    }

    /// Model A answers safely, model B does not; "[boom]" cases fail for model B
    fn models(model: &str, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        if model == "model-b" && last_user_turn(messages).contains("[boom]") {
            return Err(GatewayError::Api {
                provider: "anthropic",
                status: 500,
                message: "overloaded".to_string(),
            });
        }
        Ok(if model == "model-a" { SAFE } else { RISKY }.to_string())
    }

    /// Consistently prefers the response that mentions "nut-free"
    fn judge(_model: &str, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        let prompt = &messages[0].content;
        let a = prompt.find("Response A:").unwrap_or(0);
        let b = prompt.find("Response B:").unwrap_or(0);
        let safe = prompt.find("nut-free").unwrap_or(0);
        Ok(if safe > a && safe < b {
            r#"{"winner":"A","score_A":9,"score_B":2,"reasons":["handles the allergy"]}"#
        } else {
            r#"{"winner":"B","score_A":3,"score_B":8,"reasons":["handles the allergy"]}"#
        }
        .to_string())
    }

    type ModelFn = fn(&str, &[ChatMessage]) -> Result<String, GatewayError>;

    fn orchestrator(
        config: &BenchmarkConfig,
    ) -> (
        Orchestrator<ScriptedGateway<ModelFn>, ScriptedGateway<ModelFn>>,
        Arc<ScriptedGateway<ModelFn>>,
    ) {
        let gateway = Arc::new(ScriptedGateway::new(models as ModelFn));
        let judge_gateway = Arc::new(ScriptedGateway::new(judge as ModelFn));
        let judge = JudgeProtocol::from_config(judge_gateway, &config.judge);
        let orchestrator =
            Orchestrator::new(config, gateway.clone(), gateway.clone(), judge).unwrap();
        (orchestrator, gateway)
    }

    #[tokio::test]
    async fn test_run_judges_every_case() {
        let config = config();
        let (orchestrator, gateway) = orchestrator(&config);

        let result = orchestrator.run(&dataset(&["t1", "t2", "t3"])).await.unwrap();

        assert_eq!(gateway.calls(), 6);
        assert_eq!(result.name, "waiter-test");
        assert_eq!(result.results.len(), 3);
        assert!(result.failures.is_empty());
        assert!(result.results.iter().all(|r| r.winner() == Winner::A));

        let first = &result.results[0];
        assert_eq!(first.test_id, "t1");
        assert_eq!(first.model_a.model, "openai/model-a");
        assert_eq!(first.model_a.response, SAFE);
        assert_eq!(first.model_a.score, 8.5);
        assert_eq!(first.model_b.score, 2.5);
        assert!(first.model_a.tokens > 0);
        assert_eq!(first.verdict.reasons, vec!["handles the allergy".to_string()]);

        let summary = &result.summary;
        assert_eq!(summary.total_test_cases, 3);
        assert_eq!(summary.overall_winner, "openai/model-a");
        assert_eq!(summary.models["openai/model-a"].total_wins, 3);
        assert_eq!(summary.models["anthropic/model-b"].total_losses, 3);
        assert_eq!(summary.models["openai/model-a"].avg_score, 8.5);
        assert_eq!(summary.by_category["allergy"]["openai/model-a"].wins, 1);
        assert_eq!(summary.by_category["menu"]["openai/model-a"].wins, 2);
    }

    #[tokio::test]
    async fn test_messages_carry_system_prompt_and_turns() {
        let config = config();
        let gateway = Arc::new(ScriptedGateway::new(|model: &str, messages: &[ChatMessage]| {
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].content, "You are a restaurant waiter.");
            assert!(messages[1].content.contains("peanut allergy"));
            Ok(format!("answer from {}", model))
        }));
        let judge = JudgeProtocol::from_config(
            Arc::new(ScriptedGateway::new(judge as ModelFn)),
            &config.judge,
        );
        let orchestrator = Orchestrator::new(&config, gateway.clone(), gateway, judge).unwrap();

        let result = orchestrator.run(&dataset(&["t1"])).await.unwrap();
        assert_eq!(result.results[0].model_b.response, "answer from model-b");
        // Neither response mentions "nut-free", so the judge is position-biased toward B.
        assert_eq!(result.results[0].winner(), Winner::Tie);
    }

    #[tokio::test]
    async fn test_failed_case_is_skipped_and_recorded() {
        let config = config();
        let (orchestrator, _) = orchestrator(&config);

        let result = orchestrator
            .run(&dataset(&["t1", "boom", "t3"]))
            .await
            .unwrap();

        assert_eq!(result.results.len(), 2);
        assert!(result.results.iter().all(|r| r.test_id != "boom"));
        assert_eq!(result.summary.total_test_cases, 2);
        let a = &result.summary.models["openai/model-a"];
        assert_eq!(a.total_wins + a.total_ties + a.total_losses, 2);

        assert_eq!(result.failures.len(), 1);
        let failure = &result.failures[0];
        assert_eq!(failure.case_id, "boom");
        assert_eq!(failure.stage, Stage::ModelB);
        assert_eq!(failure.model, "anthropic/model-b");
        assert!(failure.error.contains("500"));
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_run() {
        let mut config = config();
        config.settings.fail_fast = true;
        let (orchestrator, _) = orchestrator(&config);

        let err = orchestrator
            .run(&dataset(&["t1", "boom", "t3"]))
            .await
            .unwrap_err();

        match err {
            BenchError::CaseFailed {
                case_id, stage, ..
            } => {
                assert_eq!(case_id, "boom");
                assert_eq!(stage, Stage::ModelB);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_judge_failure_is_attributed_to_judge() {
        let config = config();
        let gateway = Arc::new(ScriptedGateway::new(models as ModelFn));
        let judge_gateway = Arc::new(ScriptedGateway::new(|_: &str, _: &[ChatMessage]| {
            Err(GatewayError::Auth {
                provider: "openai",
                status: 401,
            })
        }));
        let judge = JudgeProtocol::from_config(judge_gateway, &config.judge);
        let orchestrator = Orchestrator::new(&config, gateway.clone(), gateway, judge).unwrap();

        let result = orchestrator.run(&dataset(&["t1"])).await.unwrap();
        assert!(result.results.is_empty());
        assert_eq!(result.failures[0].stage, Stage::Judge);
        assert_eq!(result.failures[0].model, "gpt-4o");
        assert_eq!(result.summary.total_test_cases, 0);
    }

    #[tokio::test]
    async fn test_cancellation_lets_in_flight_case_finish() {
        let config = config();
        let cancel = Arc::new(AtomicBool::new(false));
        let trigger = Arc::clone(&cancel);
        let gateway = Arc::new(ScriptedGateway::new(move |model: &str, messages: &[ChatMessage]| {
            if last_user_turn(messages).contains("[t2]") {
                trigger.store(true, Ordering::SeqCst);
            }
            models(model, messages)
        }));
        let judge = JudgeProtocol::from_config(
            Arc::new(ScriptedGateway::new(judge as ModelFn)),
            &config.judge,
        );
        let orchestrator = Orchestrator::new(&config, gateway.clone(), gateway, judge)
            .unwrap()
            .with_cancel_flag(cancel);

        let result = orchestrator
            .run(&dataset(&["t1", "t2", "t3", "t4"]))
            .await
            .unwrap();

        let ids: Vec<_> = result.results.iter().map(|r| r.test_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(result.summary.total_test_cases, 2);
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_dataset_order() {
        let mut config = config();
        config.settings.concurrency = 4;
        let (orchestrator, _) = orchestrator(&config);

        let ids = ["t1", "t2", "t3", "t4", "t5", "t6", "t7"];
        let result = orchestrator.run(&dataset(&ids)).await.unwrap();

        let got: Vec<_> = result.results.iter().map(|r| r.test_id.as_str()).collect();
        assert_eq!(got, ids.to_vec());
        assert_eq!(result.summary.total_test_cases, ids.len());
    }

    #[tokio::test]
    async fn test_every_capability_is_counted_once_per_case() {
        let mut config = config();
        config.capabilities = vec!["chat_completion".to_string(), "chat".to_string()];
        let (orchestrator, gateway) = orchestrator(&config);

        let result = orchestrator.run(&dataset(&["t1", "t2"])).await.unwrap();

        assert_eq!(gateway.calls(), 8);
        assert_eq!(result.results.len(), 4);
        assert_eq!(result.summary.total_test_cases, 2);
        let a = &result.summary.models["openai/model-a"];
        for capability in ["chat_completion", "chat"] {
            let tally = &a.by_capability[capability];
            assert_eq!(tally.wins + tally.ties + tally.losses, 2);
        }
    }

    #[tokio::test]
    async fn test_capability_keys_are_normalized() {
        let mut config = config();
        config.capabilities = vec![" Chat ".to_string()];
        let (orchestrator, _) = orchestrator(&config);

        let result = orchestrator.run(&dataset(&["t1", "t2"])).await.unwrap();

        assert!(result.results.iter().all(|r| r.capability == "chat"));
        for name in ["openai/model-a", "anthropic/model-b"] {
            let model = &result.summary.models[name];
            assert_eq!(model.by_capability.len(), 1);
            let tally = &model.by_capability["chat"];
            assert_eq!(
                (tally.wins + tally.ties + tally.losses) as usize,
                result.summary.total_test_cases
            );
        }
    }

    #[tokio::test]
    async fn test_repeated_capability_rejected_before_any_call() {
        let mut config = config();
        config.capabilities = vec!["chat".to_string(), "CHAT".to_string()];
        let gateway = Arc::new(ScriptedGateway::new(models as ModelFn));
        let judge = JudgeProtocol::from_config(
            Arc::new(ScriptedGateway::new(judge as ModelFn)),
            &config.judge,
        );

        let result = Orchestrator::new(&config, gateway.clone(), gateway.clone(), judge);
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateCapability(name)) if name == "chat"
        ));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_delay_spaces_case_starts_under_concurrency() {
        let mut config = config();
        config.settings.concurrency = 4;
        config.settings.sleep_between_calls = 0.05;

        let starts = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = Arc::clone(&starts);
        let gateway = Arc::new(ScriptedGateway::new(
            move |model: &str, messages: &[ChatMessage]| {
                if model == "model-a" {
                    recorded.lock().unwrap().push(Instant::now());
                }
                models(model, messages)
            },
        ));
        let judge = JudgeProtocol::from_config(
            Arc::new(ScriptedGateway::new(judge as ModelFn)),
            &config.judge,
        );
        let orchestrator =
            Orchestrator::new(&config, gateway.clone(), gateway.clone(), judge).unwrap();

        orchestrator.run(&dataset(&["t1", "t2", "t3"])).await.unwrap();

        let starts = starts.lock().unwrap();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_millis(45));
        }
    }

    #[tokio::test]
    async fn test_wrong_model_count_rejected_before_any_call() {
        let mut config = config();
        config
            .models
            .push(ModelConfig::new(ProviderKind::Gemini, "model-c"));
        let gateway = Arc::new(ScriptedGateway::new(models as ModelFn));
        let judge = JudgeProtocol::from_config(
            Arc::new(ScriptedGateway::new(judge as ModelFn)),
            &config.judge,
        );

        let result = Orchestrator::new(&config, gateway.clone(), gateway.clone(), judge);
        assert!(matches!(result, Err(ConfigError::ModelCount(3))));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_case_rejected_before_any_call() {
        let config = config();
        let (orchestrator, gateway) = orchestrator(&config);

        let mut cases = dataset(&["t1"]);
        cases.push(TestCase::new("empty", "menu", vec![]));

        let err = orchestrator.run(&cases).await.unwrap_err();
        assert!(matches!(err, BenchError::Data(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_raw_responses_can_be_omitted() {
        let mut config = config();
        config.output.include_raw_responses = false;
        let (orchestrator, _) = orchestrator(&config);

        let result = orchestrator.run(&dataset(&["t1", "t2"])).await.unwrap();
        assert!(result.results.is_empty());
        assert_eq!(result.summary.total_test_cases, 2);
    }
}
