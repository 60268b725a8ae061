//! Routing strategies: decide which providers, in what order, and with
//! which model, should serve a request.

pub mod cost_first;
pub mod performance_first;

use std::sync::Arc;

use crate::orchestrator::Request;
use crate::provider::{Provider, ProviderRegistry};

/// Ranks providers and names models for a given request. Strategies are
/// purely configurational: no I/O, no suspension, deterministic for a
/// fixed `(request, registry)` pair.
pub trait RoutingStrategy: Send + Sync {
    /// Stable strategy name, e.g. `"cost-first"`.
    fn name(&self) -> &str;

    /// Returns providers in preferred order. A `None` entry means the
    /// strategy wanted a provider that isn't present in `registry`; the
    /// Orchestrator skips these rather than treating them as failures.
    fn rank_providers(&self, req: &Request, registry: &ProviderRegistry) -> Vec<Option<Arc<dyn Provider>>>;

    /// Names the model to invoke on `provider` for this request. Returns a
    /// documented default when no specific mapping exists.
    fn select_model(&self, req: &Request, provider: &dyn Provider) -> String;
}

pub(crate) fn lookup(registry: &ProviderRegistry, name: &str) -> Option<Arc<dyn Provider>> {
    registry.get(name).cloned()
}
