//! End-to-end dispatch of a single request: guardrails, strategy
//! resolution, failover, latency measurement, and telemetry emission.
//!
//! State machine per request: `VALIDATING -> ROUTED -> ATTEMPTING(i) ->
//! { SUCCEEDED | ATTEMPTING(i+1) | EXHAUSTED }`, with guardrail rejection
//! as a short-circuit terminal transition `VALIDATING -> REJECTED`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::guardrails::Guardrails;
use crate::provider::{Provider, ProviderError, ProviderRegistry, TokenUsage};
use crate::strategy::RoutingStrategy;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// A single dispatch request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "new_request_id")]
    pub id: String,
    pub prompt: String,
    pub task_type: String,
    pub priority: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

impl Request {
    pub fn new(prompt: String, task_type: String, priority: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt,
            task_type,
            priority,
            metadata: HashMap::new(),
        }
    }
}

/// Unified response produced by the Orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub id: String,
    pub content: String,
    pub model_used: String,
    pub provider: String,
    pub usage: TokenUsage,
    pub cost_estimated: f64,
    pub latency_ms: f64,
}

/// Error taxonomy for `Orchestrator::handle`.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("guardrail violation: {reason}")]
    GuardrailViolation { reason: String },

    #[error("unknown routing strategy: {0}")]
    UnknownStrategy(String),

    #[error("no providers available for routing")]
    NoProvidersAvailable,

    #[error("all providers failed, last error: {last_error}")]
    AllProvidersFailed { last_error: ProviderError },
}

/// Composes guardrails, strategy selection, failover dispatch, and
/// telemetry emission into one `handle(request) -> Response` call.
pub struct Orchestrator {
    guardrails: Guardrails,
    providers: ProviderRegistry,
    strategies: HashMap<String, Box<dyn RoutingStrategy>>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl Orchestrator {
    pub fn new(
        guardrails: Guardrails,
        providers: ProviderRegistry,
        strategies: HashMap<String, Box<dyn RoutingStrategy>>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            guardrails,
            providers,
            strategies,
            telemetry,
        }
    }

    /// Sorted list of registered provider names, for the `/v1/providers`
    /// collaborator endpoint.
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn handle(&self, req: Request) -> Result<Response, OrchestratorError> {
        // 1. Guardrail gate.
        let outcome = self.guardrails.validate(&req.prompt);
        if !outcome.passed {
            let reason = outcome
                .reason
                .clone()
                .unwrap_or_else(|| "guardrail violation".to_string());
            self.emit(TelemetryEvent::guardrail_violation(req.id.clone(), reason.clone()))
                .await;
            return Err(OrchestratorError::GuardrailViolation { reason });
        }

        // 2. Strategy lookup.
        let strategy_key = req.priority.to_lowercase();
        let strategy = match self.strategies.get(&strategy_key) {
            Some(strategy) => strategy,
            None => {
                warn!(priority = %req.priority, "no routing strategy registered for priority");
                return Err(OrchestratorError::UnknownStrategy(req.priority.clone()));
            }
        };

        // 3. Provider ranking.
        let ranked: Vec<Arc<dyn Provider>> = strategy
            .rank_providers(&req, &self.providers)
            .into_iter()
            .flatten()
            .collect();
        if ranked.is_empty() {
            warn!(strategy = strategy.name(), "no providers available after ranking");
            return Err(OrchestratorError::NoProvidersAvailable);
        }

        // The primary provider for `fallback_used` purposes is the first
        // entry that actually resolved to a provider — not raw rank index
        // 0, which may have been a null placeholder the strategy skipped.
        let primary_name = ranked[0].name().to_string();

        // 4. Failover loop.
        let mut last_error: Option<ProviderError> = None;
        for provider in &ranked {
            let model = strategy.select_model(&req, provider.as_ref());
            let t0 = Instant::now();

            match provider.send_request(&req.prompt, &model).await {
                Ok(result) => {
                    let latency_ms = t0.elapsed().as_secs_f64() * 1000.0;
                    let fallback_used = provider.name() != primary_name;

                    self.emit(TelemetryEvent::success(
                        req.id.clone(),
                        strategy.name(),
                        provider.name(),
                        model.clone(),
                        result.usage.input_tokens as i64,
                        result.usage.output_tokens as i64,
                        result.cost_estimated,
                        latency_ms,
                        fallback_used,
                    ))
                    .await;

                    return Ok(Response {
                        id: Uuid::new_v4().to_string(),
                        content: result.content,
                        model_used: model,
                        provider: provider.name().to_string(),
                        usage: result.usage,
                        cost_estimated: result.cost_estimated,
                        latency_ms,
                    });
                }
                Err(err) => {
                    self.emit(TelemetryEvent::provider_failure(
                        req.id.clone(),
                        strategy.name(),
                        provider.name(),
                    ))
                    .await;
                    warn!(provider = provider.name(), error = %err, "provider attempt failed");
                    last_error = Some(err);
                }
            }
        }

        // 5. Exhaustion.
        Err(OrchestratorError::AllProvidersFailed {
            last_error: last_error.expect("at least one provider was attempted"),
        })
    }

    /// Emits a telemetry event, logging (but never propagating) a sink
    /// failure — a telemetry write must never mask a successful response
    /// or stop the failover loop from trying the next provider.
    async fn emit(&self, event: TelemetryEvent) {
        if let Err(err) = self.telemetry.capture(event).await {
            error!(error = %err, "failed to persist telemetry event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardrails::Guardrails;
    use crate::provider::{anthropic::AnthropicProvider, bedrock::BedrockProvider, openai::OpenAiProvider};
    use crate::strategy::{cost_first::CostFirstStrategy, performance_first::PerformanceFirstStrategy};
    use crate::telemetry::sqlite::SqliteTelemetryCollector;

    async fn full_registry() -> (ProviderRegistry, Arc<OpenAiProvider>, Arc<AnthropicProvider>, Arc<BedrockProvider>) {
        let openai = Arc::new(OpenAiProvider::default());
        let anthropic = Arc::new(AnthropicProvider::default());
        let bedrock = Arc::new(BedrockProvider::default());
        let mut registry: ProviderRegistry = HashMap::new();
        registry.insert("openai".to_string(), openai.clone());
        registry.insert("anthropic".to_string(), anthropic.clone());
        registry.insert("bedrock".to_string(), bedrock.clone());
        (registry, openai, anthropic, bedrock)
    }

    fn strategies() -> HashMap<String, Box<dyn RoutingStrategy>> {
        let mut strategies: HashMap<String, Box<dyn RoutingStrategy>> = HashMap::new();
        strategies.insert("cost".to_string(), Box::new(CostFirstStrategy));
        strategies.insert("performance".to_string(), Box::new(PerformanceFirstStrategy));
        strategies
    }

    async fn orchestrator(providers: ProviderRegistry) -> Orchestrator {
        let telemetry = Arc::new(SqliteTelemetryCollector::connect("sqlite::memory:").await.unwrap());
        Orchestrator::new(Guardrails::default(), providers, strategies(), telemetry)
    }

    #[tokio::test]
    async fn happy_path_cost_first() {
        let (registry, ..) = full_registry().await;
        let orch = orchestrator(registry).await;
        let req = Request::new("Hello".to_string(), "general".to_string(), "cost".to_string());

        let response = orch.handle(req).await.unwrap();
        assert_eq!(response.provider, "openai");
        assert_eq!(response.model_used, "GPT-4o-mini");

        let events = orch.telemetry.query_all().await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(!events[0].fallback_used);
        assert_eq!(events[0].strategy, "cost-first");
    }

    #[tokio::test]
    async fn guardrail_violation_short_circuits_dispatch() {
        let (registry, ..) = full_registry().await;
        let orch = orchestrator(registry).await;
        let req = Request::new(
            "My SSN is 123-45-6789".to_string(),
            "general".to_string(),
            "cost".to_string(),
        );

        let err = orch.handle(req).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::GuardrailViolation { .. }));

        let events = orch.telemetry.query_all().await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].guardrail_failed);
        assert!(events[0].guardrail_reason.as_ref().unwrap().contains("SSN"));
        assert!(events[0].provider.is_none());
    }

    #[tokio::test]
    async fn failover_to_second_provider() {
        let (registry, openai, ..) = full_registry().await;
        openai.set_force_failure(true);
        let orch = orchestrator(registry).await;
        let req = Request::new("Hello".to_string(), "general".to_string(), "cost".to_string());

        let response = orch.handle(req).await.unwrap();
        assert_eq!(response.provider, "anthropic");
        assert_eq!(response.model_used, "Claude-Haiku");

        let events = orch.telemetry.query_all().await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].provider_failed);
        assert_eq!(events[0].provider.as_deref(), Some("openai"));
        assert!(!events[1].provider_failed);
        assert!(events[1].fallback_used);
    }

    #[tokio::test]
    async fn all_providers_fail() {
        let (registry, openai, anthropic, bedrock) = full_registry().await;
        openai.set_force_failure(true);
        anthropic.set_force_failure(true);
        bedrock.set_force_failure(true);
        let orch = orchestrator(registry).await;
        let req = Request::new("Hello".to_string(), "general".to_string(), "cost".to_string());

        let err = orch.handle(req).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::AllProvidersFailed { .. }));

        let events = orch.telemetry.query_all().await.unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.provider_failed));
    }

    #[tokio::test]
    async fn unknown_strategy_emits_no_telemetry() {
        let (registry, ..) = full_registry().await;
        let orch = orchestrator(registry).await;
        let req = Request::new("Hello".to_string(), "general".to_string(), "balanced".to_string());

        let err = orch.handle(req).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownStrategy(_)));

        let events = orch.telemetry.query_all().await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn performance_first_with_only_openai_registered() {
        let openai = Arc::new(OpenAiProvider::default());
        let mut registry: ProviderRegistry = HashMap::new();
        registry.insert("openai".to_string(), openai);
        let orch = orchestrator(registry).await;
        let req = Request::new(
            "Hello".to_string(),
            "general".to_string(),
            "performance".to_string(),
        );

        let response = orch.handle(req).await.unwrap();
        assert_eq!(response.provider, "openai");
        assert_eq!(response.model_used, "GPT-4");

        let events = orch.telemetry.query_all().await.unwrap();
        assert_eq!(events.len(), 1);
        // First non-null ranked provider is openai itself, so this is not
        // a fallback even though it's rank index 2.
        assert!(!events[0].fallback_used);
    }

    #[tokio::test]
    async fn no_providers_available_emits_no_telemetry() {
        let orch = orchestrator(HashMap::new()).await;
        let req = Request::new("Hello".to_string(), "general".to_string(), "cost".to_string());

        let err = orch.handle(req).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NoProvidersAvailable));

        let events = orch.telemetry.query_all().await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn response_id_differs_from_request_id() {
        let (registry, ..) = full_registry().await;
        let orch = orchestrator(registry).await;
        let req = Request::new("Hello".to_string(), "general".to_string(), "cost".to_string());
        let request_id = req.id.clone();

        let response = orch.handle(req).await.unwrap();
        assert_ne!(response.id, request_id);
    }

    #[tokio::test]
    async fn list_providers_is_sorted() {
        let (registry, ..) = full_registry().await;
        let orch = orchestrator(registry).await;
        assert_eq!(orch.list_providers(), vec!["anthropic", "bedrock", "openai"]);
    }
}
