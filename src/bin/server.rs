// FinOps LLM Router
// Run with: cargo run --bin server

//! Thin HTTP facade over [`finops_llm_router::Orchestrator`]. This binary
//! wires configuration, logging, providers, and strategies together and
//! exposes `/v1/llm`, `/health`, `/v1/providers`, and `/metrics`. It
//! contains no routing logic of its own.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use finops_llm_router::config::Settings;
use finops_llm_router::provider::anthropic::AnthropicProvider;
use finops_llm_router::provider::bedrock::BedrockProvider;
use finops_llm_router::provider::openai::OpenAiProvider;
use finops_llm_router::provider::ProviderRegistry;
use finops_llm_router::strategy::cost_first::CostFirstStrategy;
use finops_llm_router::strategy::performance_first::PerformanceFirstStrategy;
use finops_llm_router::strategy::RoutingStrategy;
use finops_llm_router::telemetry::sqlite::SqliteTelemetryCollector;
use finops_llm_router::telemetry::TelemetrySink;
use finops_llm_router::{Guardrails, Orchestrator, OrchestratorError, Request};

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
    telemetry: Arc<dyn TelemetrySink>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(settings.log_level.clone()))
        .init();

    info!("Starting FinOps LLM Router...");
    info!("DB_URL: {}", settings.db_url);
    info!("BIND_ADDR: {}", settings.bind_addr);

    let mut providers: ProviderRegistry = HashMap::new();
    providers.insert("openai".to_string(), Arc::new(OpenAiProvider::default()));
    providers.insert("anthropic".to_string(), Arc::new(AnthropicProvider::default()));
    providers.insert("bedrock".to_string(), Arc::new(BedrockProvider::default()));
    info!("Providers configured: openai, anthropic, bedrock");

    let mut strategies: HashMap<String, Box<dyn RoutingStrategy>> = HashMap::new();
    strategies.insert("cost".to_string(), Box::new(CostFirstStrategy));
    strategies.insert("performance".to_string(), Box::new(PerformanceFirstStrategy));
    info!("Strategies configured: cost, performance");

    let telemetry: Arc<dyn TelemetrySink> =
        Arc::new(SqliteTelemetryCollector::connect(&settings.db_url).await?);

    let orchestrator = Arc::new(Orchestrator::new(
        Guardrails::default(),
        providers,
        strategies,
        telemetry.clone(),
    ));

    let state = AppState {
        orchestrator,
        telemetry,
    };

    let app = Router::new()
        .route("/v1/llm", post(handle_llm))
        .route("/health", get(health))
        .route("/v1/providers", get(list_providers))
        .route("/metrics", get(metrics))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!("Listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn handle_llm(
    State(state): State<AppState>,
    Json(req): Json<Request>,
) -> Result<Json<finops_llm_router::Response>, RouterError> {
    let response = state.orchestrator.handle(req).await?;
    Ok(Json(response))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "finops-llm-router"
    }))
}

async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "providers": state.orchestrator.list_providers()
    }))
}

/// Coarse counters derived from the telemetry log. The routing core does
/// not compute aggregates itself; this endpoint folds over `query_all`.
async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.telemetry.query_all().await {
        Ok(events) => {
            let requests_total = events.len();
            let cost_estimate_usd: f64 = events.iter().filter_map(|e| e.cost_estimated).sum();
            let failures_total = events.iter().filter(|e| e.provider_failed).count();
            let guardrail_violations_total = events.iter().filter(|e| e.guardrail_failed).count();
            let latencies: Vec<f64> = events.iter().filter_map(|e| e.latency_ms).collect();
            let avg_latency_ms = if latencies.is_empty() {
                0.0
            } else {
                latencies.iter().sum::<f64>() / latencies.len() as f64
            };

            Json(serde_json::json!({
                "requests_total": requests_total,
                "cost_estimate_usd": cost_estimate_usd,
                "failures_total": failures_total,
                "guardrail_violations_total": guardrail_violations_total,
                "avg_latency_ms": avg_latency_ms,
            }))
            .into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to read telemetry for metrics endpoint");
            (StatusCode::INTERNAL_SERVER_ERROR, "telemetry unavailable").into_response()
        }
    }
}

/// Maps an `OrchestratorError` to an HTTP status class: guardrail
/// rejections and unknown strategies are client errors, routing
/// exhaustion is a server error.
struct RouterError(OrchestratorError);

impl From<OrchestratorError> for RouterError {
    fn from(err: OrchestratorError) -> Self {
        RouterError(err)
    }
}

impl IntoResponse for RouterError {
    fn into_response(self) -> AxumResponse {
        let (status, message) = match &self.0 {
            OrchestratorError::GuardrailViolation { reason } => {
                (StatusCode::BAD_REQUEST, reason.clone())
            }
            OrchestratorError::UnknownStrategy(priority) => (
                StatusCode::BAD_REQUEST,
                format!("unknown routing strategy: {priority}"),
            ),
            OrchestratorError::NoProvidersAvailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "no providers available for routing".to_string(),
            ),
            OrchestratorError::AllProvidersFailed { last_error } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("all providers failed: {last_error}"),
            ),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
