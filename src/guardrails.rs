//! Content-safety gate for the router.
//!
//! `Guardrails::validate` is pure, synchronous, and stateless: it never
//! mutates `self`. The reference implementation this was ported from kept
//! the last violation reason on the struct (`self.last_violation`), which
//! is racy once multiple requests share one `Guardrails` instance
//! concurrently. Returning the reason alongside the verdict removes the
//! shared mutable state entirely.

/// Result of a single guardrail check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardrailOutcome {
    pub passed: bool,
    pub reason: Option<String>,
}

impl GuardrailOutcome {
    fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    fn violation(token: &str) -> Self {
        Self {
            passed: false,
            reason: Some(format!("Forbidden keyword found: {token}")),
        }
    }
}

/// Stateless predicate over prompt text.
#[derive(Debug, Clone)]
pub struct Guardrails {
    forbidden_tokens: Vec<String>,
}

impl Guardrails {
    /// Build a guardrail with a custom forbidden-token list.
    pub fn new(forbidden_tokens: Vec<String>) -> Self {
        Self { forbidden_tokens }
    }

    /// Returns `true` iff none of the configured forbidden tokens occurs in
    /// `prompt`. Matching is substring-based and case-sensitive, matching
    /// the reference behavior; the first offending token is reported.
    pub fn validate(&self, prompt: &str) -> GuardrailOutcome {
        for token in &self.forbidden_tokens {
            if prompt.contains(token.as_str()) {
                return GuardrailOutcome::violation(token);
            }
        }
        GuardrailOutcome::pass()
    }
}

impl Default for Guardrails {
    /// The reference forbidden-token list: `["SSN", "credit card"]`.
    fn default() -> Self {
        Self::new(vec!["SSN".to_string(), "credit card".to_string()])
    }
}
