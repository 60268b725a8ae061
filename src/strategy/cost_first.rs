//! Cost-first strategy: rank order `openai, anthropic, bedrock`; model
//! choices optimize price.

use std::sync::Arc;

use super::{lookup, RoutingStrategy};
use crate::orchestrator::Request;
use crate::provider::{Provider, ProviderRegistry};

#[derive(Debug, Default)]
pub struct CostFirstStrategy;

impl RoutingStrategy for CostFirstStrategy {
    fn name(&self) -> &str {
        "cost-first"
    }

    fn rank_providers(
        &self,
        _req: &Request,
        registry: &ProviderRegistry,
    ) -> Vec<Option<Arc<dyn Provider>>> {
        vec![
            lookup(registry, "openai"),
            lookup(registry, "anthropic"),
            lookup(registry, "bedrock"),
        ]
    }

    fn select_model(&self, _req: &Request, provider: &dyn Provider) -> String {
        match provider.name() {
            "openai" => "GPT-4o-mini".to_string(),
            "anthropic" => "Claude-Haiku".to_string(),
            _ => "default-model".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{anthropic::AnthropicProvider, bedrock::BedrockProvider, openai::OpenAiProvider};
    use std::collections::HashMap;

    fn registry() -> ProviderRegistry {
        let mut registry: ProviderRegistry = HashMap::new();
        registry.insert("openai".to_string(), Arc::new(OpenAiProvider::default()));
        registry.insert("anthropic".to_string(), Arc::new(AnthropicProvider::default()));
        registry.insert("bedrock".to_string(), Arc::new(BedrockProvider::default()));
        registry
    }

    #[test]
    fn ranks_openai_first() {
        let strategy = CostFirstStrategy;
        let req = Request::new("hi".to_string(), "general".to_string(), "cost".to_string());
        let ranked = strategy.rank_providers(&req, &registry());
        let names: Vec<_> = ranked.iter().map(|p| p.as_ref().map(|p| p.name())).collect();
        assert_eq!(names, vec![Some("openai"), Some("anthropic"), Some("bedrock")]);
    }

    #[test]
    fn model_choices_optimize_price() {
        let strategy = CostFirstStrategy;
        let req = Request::new("hi".to_string(), "general".to_string(), "cost".to_string());
        let openai = OpenAiProvider::default();
        let anthropic = AnthropicProvider::default();
        let bedrock = BedrockProvider::default();
        assert_eq!(strategy.select_model(&req, &openai), "GPT-4o-mini");
        assert_eq!(strategy.select_model(&req, &anthropic), "Claude-Haiku");
        assert_eq!(strategy.select_model(&req, &bedrock), "default-model");
    }

    #[test]
    fn missing_provider_ranks_as_none() {
        let strategy = CostFirstStrategy;
        let mut registry = registry();
        registry.remove("bedrock");
        let req = Request::new("hi".to_string(), "general".to_string(), "cost".to_string());
        let ranked = strategy.rank_providers(&req, &registry);
        assert!(ranked[2].is_none());
    }
}
