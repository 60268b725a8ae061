//! Mock Amazon Bedrock provider.
//!
//! The Python proof of concept this crate is ported from ranks a
//! `"bedrock"` provider in both reference strategies but never implements
//! one (`providers.get("bedrock")` always resolves to `None` there, so the
//! third failover slot is dead code). This crate supplies the provider the
//! strategies already name, with Titan pricing, so failover has three real
//! rungs instead of two.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{LLMResult, Provider, ProviderError, TokenUsage};

fn cost_per_token(model: &str) -> (f64, f64) {
    match model {
        "Titan-1" => (0.0000008, 0.0000016),
        _ => (0.000001, 0.000002), // default-model
    }
}

pub struct BedrockProvider {
    client: reqwest::Client,
    base_url: String,
    force_failure: AtomicBool,
}

impl BedrockProvider {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or_else(|| "https://bedrock-runtime.us-east-1.amazonaws.com".to_string()),
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

impl Default for BedrockProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Provider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn send_request(&self, prompt: &str, model: &str) -> Result<LLMResult, ProviderError> {
        let _ = &self.client;
        if self.force_failure.load(Ordering::SeqCst) {
            return Err(ProviderError::Upstream {
                provider: self.name().to_string(),
                message: "simulated Bedrock outage".to_string(),
            });
        }

        let input_tokens = (prompt.len() as u64 / 4).max(1);
        let output_tokens = input_tokens / 2 + 1;
        let (input_cost, output_cost) = cost_per_token(model);

        Ok(LLMResult {
            content: format!("[bedrock:{model}] {prompt}"),
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
        let provider = BedrockProvider::default();
        let result = provider.send_request("hello", "Titan-1").await.unwrap();
        assert!(result.usage.input_tokens > 0);
        assert!(result.cost_estimated >= 0.0);
    }

    #[tokio::test]
    async fn forced_failure_surfaces_as_upstream_error() {
        let provider = BedrockProvider::default();
        provider.set_force_failure(true);
        let err = provider.send_request("hi", "Titan-1").await.unwrap_err();
        assert_eq!(err.provider(), "bedrock");
    }
}
