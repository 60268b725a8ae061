//! Performance-first strategy: rank order `anthropic, bedrock, openai`;
//! model choices optimize capability.

use std::sync::Arc;

use super::{lookup, RoutingStrategy};
use crate::orchestrator::Request;
use crate::provider::{Provider, ProviderRegistry};

#[derive(Debug, Default)]
pub struct PerformanceFirstStrategy;

impl RoutingStrategy for PerformanceFirstStrategy {
    fn name(&self) -> &str {
        "performance-first"
    }

    fn rank_providers(
        &self,
        _req: &Request,
        registry: &ProviderRegistry,
    ) -> Vec<Option<Arc<dyn Provider>>> {
        vec![
            lookup(registry, "anthropic"),
            lookup(registry, "bedrock"),
            lookup(registry, "openai"),
        ]
    }

    fn select_model(&self, _req: &Request, provider: &dyn Provider) -> String {
        match provider.name() {
            "openai" => "GPT-4".to_string(),
            "anthropic" => "Claude-2".to_string(),
            "bedrock" => "Titan-1".to_string(),
            _ => "default-model".to_string(),
        }
    }
}
