use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Supported LLM providers
///
/// DeepSeek, Groq and OpenRouter expose OpenAI-compatible APIs and are served
/// by the same adapter with a different base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    DeepSeek,
    Groq,
    OpenRouter,
}

impl ProviderKind {
    /// All supported providers, in a stable order
    pub fn all() -> &'static [ProviderKind] {
        &[
            Self::OpenAi,
            Self::Anthropic,
            Self::Gemini,
            Self::DeepSeek,
            Self::Groq,
            Self::OpenRouter,
        ]
    }

    /// Wire name of the provider (matches the serde representation)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
            Self::Groq => "groq",
            Self::OpenRouter => "openrouter",
        }
    }

    /// Environment variable conventionally holding this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Gemini => "GOOGLE_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::Groq => "GROQ_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "gemini" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            "groq" => Ok(Self::Groq),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(DomainError::validation(format!(
                "Unsupported provider '{}'. Supported: {}",
                other,
                Self::all()
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_roundtrip() {
        for kind in ProviderKind::all() {
            let parsed: ProviderKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, *kind);
        }
    }

    #[test]
    fn test_provider_kind_parse_unknown() {
        let result = "cohere".parse::<ProviderKind>();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unsupported"));
    }

    #[test]
    fn test_provider_kind_serde() {
        let json = serde_json::to_string(&ProviderKind::DeepSeek).unwrap();
        assert_eq!(json, "\"deepseek\"");

        let parsed: ProviderKind = serde_json::from_str("\"openrouter\"").unwrap();
        assert_eq!(parsed, ProviderKind::OpenRouter);
    }
}
