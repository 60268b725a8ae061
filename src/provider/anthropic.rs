//! Mock Anthropic provider. See `provider::openai` for the rationale behind
//! keeping these as in-process mocks rather than live HTTP clients.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{LLMResult, Provider, ProviderError, TokenUsage};

fn cost_per_token(model: &str) -> (f64, f64) {
    match model {
        "Claude-Haiku" => (0.00000025, 0.00000125),
        "Claude-2" => (0.000008, 0.000024),
        _ => (0.000003, 0.000015), // default-model, Sonnet-ish pricing
    }
}

pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    force_failure: AtomicBool,
}

impl AnthropicProvider {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.unwrap_or_else(|| "https://api.anthropic.com".to_string()),
            force_failure: AtomicBool::new(false),
        }
    }

    pub fn set_force_failure(&self, fail: bool) {
        self.force_failure.store(fail, Ordering::SeqCst);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn send_request(&self, prompt: &str, model: &str) -> Result<LLMResult, ProviderError> {
        let _ = &self.client;
        if self.force_failure.load(Ordering::SeqCst) {
            return Err(ProviderError::Upstream {
                provider: self.name().to_string(),
                message: "simulated Anthropic outage".to_string(),
            });
        }

        let input_tokens = (prompt.len() as u64 / 4).max(1);
        let output_tokens = input_tokens / 2 + 1;
        let (input_cost, output_cost) = cost_per_token(model);

        Ok(LLMResult {
            content: format!("[anthropic:{model}] {prompt}"),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_request_reports_non_negative_usage_and_cost() {
        let provider = AnthropicProvider::default();
        let result = provider.send_request("hello", "Claude-Haiku").await.unwrap();
        assert!(result.usage.input_tokens > 0);
        assert!(result.cost_estimated >= 0.0);
    }

    #[tokio::test]
    async fn forced_failure_surfaces_as_upstream_error() {
        let provider = AnthropicProvider::default();
        provider.set_force_failure(true);
        let err = provider.send_request("hi", "Claude-2").await.unwrap_err();
        assert_eq!(err.provider(), "anthropic");
    }
}
