//! Concrete provider adapters
//!
//! One adapter per wire protocol: the OpenAI chat-completions shape (also
//! serving DeepSeek, Groq and OpenRouter behind their own base URLs), the
//! Anthropic messages API, and the Gemini generateContent API. All of them
//! share the transport error classification and bounded retry policy here.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::domain::{AdapterFactory, DomainError, ProviderAdapter, ProviderError, ProviderKind};
use crate::infrastructure::http::{HttpClient, HttpError};

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;

/// Attempts per call for retryable failures
const MAX_ATTEMPTS: u32 = 3;

/// First backoff delay; doubles per attempt
const BASE_BACKOFF: Duration = Duration::from_millis(200);

/// Classify a transport failure into the typed provider error taxonomy
pub(crate) fn classify_http_error(provider: ProviderKind, error: HttpError) -> ProviderError {
    match error {
        HttpError::Status { status, body } => match status {
            401 | 403 => ProviderError::authentication(provider),
            429 => ProviderError::rate_limited(provider, None),
            408 | 500..=599 => {
                ProviderError::transient(provider, format!("HTTP {}: {}", status, truncate(&body)))
            }
            _ => ProviderError::api(provider, format!("HTTP {}: {}", status, truncate(&body))),
        },
        HttpError::Network(message) => ProviderError::transient(provider, message),
        HttpError::Decode(message) => ProviderError::invalid_response(provider, message),
    }
}

fn truncate(body: &str) -> String {
    const MAX_LEN: usize = 200;
    if body.len() <= MAX_LEN {
        body.to_string()
    } else {
        format!("{}...", &body[..MAX_LEN])
    }
}

/// Run a provider call, retrying retryable failures a bounded number of
/// times with exponential backoff
///
/// Authentication and API errors propagate immediately; the engine never
/// retries on its own.
pub(crate) async fn with_retries<T, F, Fut>(mut call: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 1;

    loop {
        match call().await {
            Err(error) if error.is_retryable() && attempt < MAX_ATTEMPTS => {
                let backoff = BASE_BACKOFF * 2u32.pow(attempt - 1);
                warn!(
                    provider = %error.provider(),
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retryable provider failure: {}",
                    error
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Factory building adapters over a shared reqwest client
#[derive(Debug, Clone)]
pub struct ProviderAdapterFactory {
    client: HttpClient,
}

impl ProviderAdapterFactory {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl Default for ProviderAdapterFactory {
    fn default() -> Self {
        Self::new(HttpClient::new())
    }
}

impl AdapterFactory for ProviderAdapterFactory {
    fn create(
        &self,
        kind: ProviderKind,
        api_key: &str,
    ) -> Result<Arc<dyn ProviderAdapter>, DomainError> {
        let client = self.client.clone();

        let adapter: Arc<dyn ProviderAdapter> = match kind {
            ProviderKind::OpenAi => Arc::new(OpenAiAdapter::openai(client, api_key)),
            ProviderKind::DeepSeek => Arc::new(OpenAiAdapter::deepseek(client, api_key)),
            ProviderKind::Groq => Arc::new(OpenAiAdapter::groq(client, api_key)),
            ProviderKind::OpenRouter => Arc::new(OpenAiAdapter::openrouter(client, api_key)),
            ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(client, api_key)),
            ProviderKind::Gemini => Arc::new(GeminiAdapter::new(client, api_key)),
        };

        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_classification() {
        let err = classify_http_error(ProviderKind::OpenAi, HttpError::status(401, "bad key"));
        assert_eq!(err, ProviderError::authentication(ProviderKind::OpenAi));

        let err = classify_http_error(ProviderKind::Gemini, HttpError::status(429, "quota"));
        assert!(err.is_retryable());

        let err = classify_http_error(ProviderKind::OpenAi, HttpError::status(503, "overloaded"));
        assert!(err.is_retryable());

        let err = classify_http_error(ProviderKind::OpenAi, HttpError::status(400, "bad request"));
        assert!(!err.is_retryable());

        let err = classify_http_error(
            ProviderKind::Anthropic,
            HttpError::Network("connection reset".to_string()),
        );
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicUsize::new(0);

        let result = with_retries(|| {
            let n = calls.fetch_add(1, Ordering::Relaxed);
            async move {
                if n == 0 {
                    Err(ProviderError::transient(ProviderKind::OpenAi, "503"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = with_retries(|| {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(ProviderError::rate_limited(ProviderKind::Groq, None)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_authentication_never_retried() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), _> = with_retries(|| {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(ProviderError::authentication(ProviderKind::Anthropic)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
