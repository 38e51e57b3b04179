//! Environment-backed secret store

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;

use crate::domain::{DomainError, ProviderKind, SecretStore};

/// Secret store reading API keys from environment variables
///
/// An unset variable means the provider is unconfigured, not an error; the
/// engine's preflight turns that into a validation failure.
#[derive(Debug)]
pub struct EnvSecretStore {
    mappings: HashMap<ProviderKind, String>,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
        }
    }

    /// Conventional variable names for every supported provider
    pub fn with_defaults(mut self) -> Self {
        for kind in ProviderKind::all() {
            self.mappings.insert(*kind, kind.env_var().to_string());
        }
        self
    }

    pub fn with_mapping(mut self, kind: ProviderKind, var: impl Into<String>) -> Self {
        self.mappings.insert(kind, var.into());
        self
    }
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::new().with_defaults()
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, provider: ProviderKind) -> Result<Option<String>, DomainError> {
        let Some(var) = self.mappings.get(&provider) else {
            return Ok(None);
        };

        match env::var(var) {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            _ => Ok(None),
        }
    }
}
