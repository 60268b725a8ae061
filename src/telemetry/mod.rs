//! Append-only telemetry sink: one structured event per decision outcome.

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One structured, append-only record describing a terminal outcome or a
/// single failed provider attempt.
///
/// Column order matches the dashboard-facing schema: `timestamp,
/// request_id, strategy, provider, model, usage_input, usage_output,
/// cost_estimated, latency_ms, guardrail_reason, guardrail_failed,
/// fallback_used, provider_failed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryEvent {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub strategy: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub usage_input: Option<i64>,
    pub usage_output: Option<i64>,
    pub cost_estimated: Option<f64>,
    pub latency_ms: Option<f64>,
    pub guardrail_reason: Option<String>,
    pub guardrail_failed: bool,
    pub fallback_used: bool,
    pub provider_failed: bool,
}

impl TelemetryEvent {
    pub fn guardrail_violation(request_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: request_id.into(),
            strategy: "N/A".to_string(),
            provider: None,
            model: None,
            usage_input: None,
            usage_output: None,
            cost_estimated: None,
            latency_ms: None,
            guardrail_reason: Some(reason.into()),
            guardrail_failed: true,
            fallback_used: false,
            provider_failed: false,
        }
    }

    pub fn provider_failure(
        request_id: impl Into<String>,
        strategy: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: request_id.into(),
            strategy: strategy.into(),
            provider: Some(provider.into()),
            model: None,
            usage_input: None,
            usage_output: None,
            cost_estimated: None,
            latency_ms: None,
            guardrail_reason: None,
            guardrail_failed: false,
            fallback_used: false,
            provider_failed: true,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn success(
        request_id: impl Into<String>,
        strategy: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
        usage_input: i64,
        usage_output: i64,
        cost_estimated: f64,
        latency_ms: f64,
        fallback_used: bool,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: request_id.into(),
            strategy: strategy.into(),
            provider: Some(provider.into()),
            model: Some(model.into()),
            usage_input: Some(usage_input),
            usage_output: Some(usage_output),
            cost_estimated: Some(cost_estimated),
            latency_ms: Some(latency_ms),
            guardrail_reason: None,
            guardrail_failed: false,
            fallback_used,
            provider_failed: false,
        }
    }
}

/// Errors from persisting or reading telemetry. A `capture` failure on the
/// success path must never turn a dispatched Response into an error;
/// callers are expected to log this out-of-band rather than propagate it
/// into the request/response cycle.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("telemetry sink error: {0}")]
    Sink(#[from] sqlx::Error),
}

/// Durable, append-only sink for decision events. Implementations must
/// tolerate concurrent writers from independent requests; events written
/// by one writer are readable in insertion order, but ordering across
/// writers is not guaranteed (consumers of `query_all` sort by timestamp
/// if they need a global view).
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn capture(&self, event: TelemetryEvent) -> Result<(), TelemetryError>;

    /// Full ordered log, used by the external analytics dashboard.
    async fn query_all(&self) -> Result<Vec<TelemetryEvent>, TelemetryError>;
}
