//! Mock OpenAI provider.
//!
//! Returns a deterministic, in-process response instead of calling the real
//! OpenAI API — this crate's Non-goals exclude calling live LLM APIs. The
//! `reqwest::Client` field is unused by the mock path; it documents the
//! shape a live integration would take.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{LLMResult, Provider, ProviderError, TokenUsage};

/// Cost per token for the models this provider answers for, in USD.
fn cost_per_token(model: &str) -> (f64, f64) {
    match model {
        "GPT-4o-mini" => (0.00000015, 0.0000006),
        "GPT-4" => (0.00003, 0.00006),
        _ => (0.00001, 0.00003), // default-model
    }
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    force_failure: AtomicBool,
}

impl OpenAiProvider {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            force_failure: AtomicBool::new(false),
        }
    }

    /// Test hook: make the next and all subsequent `send_request` calls
    /// fail, to exercise the Orchestrator's failover path deterministically.
    pub fn set_force_failure(&self, fail: bool) {
        self.force_failure.store(fail, Ordering::SeqCst);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn send_request(&self, prompt: &str, model: &str) -> Result<LLMResult, ProviderError> {
        let _ = &self.client;
        if self.force_failure.load(Ordering::SeqCst) {
            return Err(ProviderError::Upstream {
                provider: self.name().to_string(),
                message: "simulated OpenAI outage".to_string(),
            });
        }

        let input_tokens = (prompt.len() as u64 / 4).max(1);
        let output_tokens = input_tokens / 2 + 1;
        let (input_cost, output_cost) = cost_per_token(model);

        Ok(LLMResult {
            content: format!("[openai:{model}] {prompt}"),
            usage: TokenUsage {
                input_tokens,
                output_tokens,
            },
            cost_estimated: input_tokens as f64 * input_cost + output_tokens as f64 * output_cost,
        })
    }

    async fn health_check(&self) -> bool {
        !self.force_failure.load(Ordering::SeqCst)
    }

    async fn get_usage(&self, request_id: &str) -> HashMap<String, serde_json::Value> {
        let mut usage = HashMap::new();
        usage.insert(
            "request_id".to_string(),
            serde_json::Value::String(request_id.to_string()),
        );
        usage
    }
}
