use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, ProviderError, ProviderKind};
use crate::domain::DomainError;

/// Uniform interface over one third-party LLM API
///
/// The engine only ever talks to this trait; it never branches on provider
/// identity. Adapters own bounded retry of retryable failures.
#[async_trait]
pub trait ProviderAdapter: Send + Sync + Debug {
    /// Cheap connectivity probe. Must not consume meaningful quota.
    async fn health_check(&self) -> Result<bool, ProviderError>;

    /// Single request-response completion. No streaming.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Which provider this adapter fronts
    fn kind(&self) -> ProviderKind;

    /// Model used when a step does not name one
    fn default_model(&self) -> &str;
}

/// Builds adapters from a provider kind and its API key
///
/// The tagged [`ProviderKind`] union is dispatched here, once, so the engine
/// never has to know which concrete adapter it is holding.
pub trait AdapterFactory: Send + Sync + Debug {
    fn create(
        &self,
        kind: ProviderKind,
        api_key: &str,
    ) -> Result<Arc<dyn ProviderAdapter>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::provider::Usage;

    /// Scripted adapter for engine tests, counting calls per method
    #[derive(Debug)]
    pub struct MockAdapter {
        kind: ProviderKind,
        response_text: String,
        usage: Usage,
        complete_error: Option<ProviderError>,
        healthy: bool,
        health_calls: AtomicUsize,
        complete_calls: AtomicUsize,
    }

    impl MockAdapter {
        pub fn new(kind: ProviderKind) -> Self {
            Self {
                kind,
                response_text: "mock response".to_string(),
                usage: Usage::new(10, 20),
                complete_error: None,
                healthy: true,
                health_calls: AtomicUsize::new(0),
                complete_calls: AtomicUsize::new(0),
            }
        }

        pub fn with_response(mut self, text: impl Into<String>) -> Self {
            self.response_text = text.into();
            self
        }

        pub fn with_usage(mut self, usage: Usage) -> Self {
            self.usage = usage;
            self
        }

        pub fn with_complete_error(mut self, error: ProviderError) -> Self {
            self.complete_error = Some(error);
            self
        }

        pub fn unhealthy(mut self) -> Self {
            self.healthy = false;
            self
        }

        pub fn health_calls(&self) -> usize {
            self.health_calls.load(Ordering::Relaxed)
        }

        pub fn complete_calls(&self) -> usize {
            self.complete_calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockAdapter {
        async fn health_check(&self) -> Result<bool, ProviderError> {
            self.health_calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.healthy)
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.complete_calls.fetch_add(1, Ordering::Relaxed);

            if let Some(ref error) = self.complete_error {
                return Err(error.clone());
            }

            Ok(
                CompletionResponse::new(self.response_text.clone(), request.model)
                    .with_usage(self.usage),
            )
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn default_model(&self) -> &str {
            "mock-model"
        }
    }
}
