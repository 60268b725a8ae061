// FinOps LLM Router
// A policy-gated request dispatcher that routes prompts across multiple LLM
// providers according to a caller-supplied priority, fails over across
// providers, and emits structured telemetry for FinOps analysis.

//! # FinOps LLM Router
//!
//! This crate implements the routing core of the FinOps LLM Router: a
//! content-safety gate, a pluggable provider-ranking strategy subsystem, a
//! failover-aware dispatcher, and an append-only telemetry sink.
//!
//! ## Core Components
//!
//! - [`Guardrails`]: pre-provider content-safety check
//! - [`Provider`]: abstraction over one LLM vendor
//! - [`RoutingStrategy`]: ranks providers and names models for a request
//! - [`TelemetrySink`]: durable, append-only decision log
//! - [`Orchestrator`]: composes the above into `handle(request) -> Response`
//!
//! The HTTP surface, process bootstrap, and analytics dashboard that sit on
//! top of this crate are external collaborators (see `src/bin/server.rs`
//! for a thin example) and contain no routing logic of their own.

pub mod config;
pub mod guardrails;
pub mod orchestrator;
pub mod provider;
pub mod strategy;
pub mod telemetry;

pub use guardrails::{GuardrailOutcome, Guardrails};
pub use orchestrator::{Orchestrator, OrchestratorError, Request, Response};
pub use provider::{LLMResult, Provider, ProviderError, TokenUsage};
pub use strategy::RoutingStrategy;
pub use telemetry::{TelemetryEvent, TelemetrySink};
