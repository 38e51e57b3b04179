//! Engine error types
//!
//! Every failure of an execution pass collapses into one of these kinds; the
//! Display string becomes the run's `error_message`. Cap violations carry
//! their own variant so a deliberate safety limit is never mistaken for a
//! provider outage.

use thiserror::Error;

use crate::domain::{DomainError, ProviderError};

/// Errors raised while validating or executing a run
#[derive(Debug, Error)]
pub enum EngineError {
    /// Preflight validation failure: missing secret, dead provider, bad
    /// variable reference. Never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Provider failure that survived the adapter's retry policy
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Template rendering failure at execution time
    #[error("Step {index}: {message}")]
    Template { index: usize, message: String },

    /// A test-run budget was exceeded
    #[error("Execution cap exceeded: {0}")]
    CapExceeded(String),

    /// Failure in a collaborator (repository, artifact store, secret store)
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn template(index: usize, message: impl Into<String>) -> Self {
        Self::Template {
            index,
            message: message.into(),
        }
    }

    pub fn max_steps_exceeded(max_steps: usize) -> Self {
        Self::CapExceeded(format!(
            "maximum of {} steps reached in test-run mode",
            max_steps
        ))
    }

    pub fn runtime_exceeded(max_runtime_secs: u64) -> Self {
        Self::CapExceeded(format!(
            "wall-clock budget of {}s exhausted in test-run mode",
            max_runtime_secs
        ))
    }

    pub fn tokens_exceeded(index: usize, cap: u32, generated: u32) -> Self {
        Self::CapExceeded(format!(
            "step {} generated {} tokens, over the per-step cap of {}",
            index, generated, cap
        ))
    }

    /// Whether this is a deliberate cap violation rather than an outage
    pub fn is_cap_violation(&self) -> bool {
        matches!(self, Self::CapExceeded(_))
    }
}
