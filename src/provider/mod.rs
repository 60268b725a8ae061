//! Provider abstraction: one prompt against one model, reported back as a
//! unified [`LLMResult`].
//!
//! Concrete providers (`openai`, `anthropic`, `bedrock`) are mock responders
//! suitable for the FinOps proof of concept — no external HTTP calls are
//! made — but each carries the shape a live HTTP-backed client would need
//! (a `reqwest::Client`, a base URL) so swapping in a real integration is a
//! matter of replacing `send_request`'s body, not the trait.

pub mod anthropic;
pub mod bedrock;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Token accounting for one completed provider call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Unified result of a single `send_request` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LLMResult {
    pub content: String,
    pub usage: TokenUsage,
    pub cost_estimated: f64,
}

/// Failure modes for a single provider attempt. Never surfaced directly to
/// a router caller; the Orchestrator catches these and converts them into
/// per-attempt telemetry events, triggering failover to the next provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("request to {provider} timed out")]
    Timeout { provider: String },

    #[error("network error talking to {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("{provider} returned a malformed payload: {message}")]
    Malformed { provider: String, message: String },

    #[error("{provider} rejected the request: {message}")]
    Upstream { provider: String, message: String },
}

impl ProviderError {
    pub fn provider(&self) -> &str {
        match self {
            ProviderError::Timeout { provider } => provider,
            ProviderError::Network { provider, .. } => provider,
            ProviderError::Malformed { provider, .. } => provider,
            ProviderError::Upstream { provider, .. } => provider,
        }
    }
}

/// Executes one prompt against one model; reports cost, token usage,
/// health. Each call may suspend; implementations must be `Send + Sync` so
/// the Orchestrator may call into multiple providers across concurrently
/// dispatched requests.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable provider name, e.g. `"openai"`.
    fn name(&self) -> &str;

    /// Performs the external call. Fails with [`ProviderError`] when the
    /// external system errors, times out, or returns a malformed payload.
    /// A successful result carries non-negative token counts and a
    /// non-negative cost estimate.
    async fn send_request(&self, prompt: &str, model: &str) -> Result<LLMResult, ProviderError>;

    /// Cheap liveness probe. Never fails.
    async fn health_check(&self) -> bool;

    /// Optional post-hoc usage lookup.
    async fn get_usage(&self, request_id: &str) -> HashMap<String, serde_json::Value>;
}

impl fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Provider({})", self.name())
    }
}

/// Immutable mapping from a stable provider name to a provider instance.
pub type ProviderRegistry = HashMap<String, std::sync::Arc<dyn Provider>>;
