use thiserror::Error;

use super::ProviderKind;

/// Typed failures from a provider adapter
///
/// The retry policy keys off the variant: rate limits and transient transport
/// failures may be retried a bounded number of times, authentication failures
/// never are. Messages must not contain API keys.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("{provider}: invalid API key or authentication failed")]
    Authentication { provider: ProviderKind },

    #[error("{provider}: rate limit exceeded")]
    RateLimited {
        provider: ProviderKind,
        retry_after_secs: Option<u64>,
    },

    #[error("{provider}: transient failure - {message}")]
    Transient {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider}: API error - {message}")]
    Api {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider}: invalid response - {message}")]
    InvalidResponse {
        provider: ProviderKind,
        message: String,
    },
}

impl ProviderError {
    pub fn authentication(provider: ProviderKind) -> Self {
        Self::Authentication { provider }
    }

    pub fn rate_limited(provider: ProviderKind, retry_after_secs: Option<u64>) -> Self {
        Self::RateLimited {
            provider,
            retry_after_secs,
        }
    }

    pub fn transient(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Transient {
            provider,
            message: message.into(),
        }
    }

    pub fn api(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::Api {
            provider,
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: ProviderKind, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider,
            message: message.into(),
        }
    }

    /// Provider this error originated from
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Authentication { provider }
            | Self::RateLimited { provider, .. }
            | Self::Transient { provider, .. }
            | Self::Api { provider, .. }
            | Self::InvalidResponse { provider, .. } => *provider,
        }
    }

    /// Whether a bounded retry with backoff is worthwhile
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Transient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::rate_limited(ProviderKind::OpenAi, Some(2)).is_retryable());
        assert!(ProviderError::transient(ProviderKind::Gemini, "503").is_retryable());
        assert!(!ProviderError::authentication(ProviderKind::Anthropic).is_retryable());
        assert!(!ProviderError::api(ProviderKind::OpenAi, "bad request").is_retryable());
    }

    #[test]
    fn test_display_names_provider() {
        let error = ProviderError::authentication(ProviderKind::DeepSeek);
        assert_eq!(
            error.to_string(),
            "deepseek: invalid API key or authentication failed"
        );
    }
}
