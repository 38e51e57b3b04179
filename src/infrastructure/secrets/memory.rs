//! In-memory secret store

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{DomainError, ProviderKind, SecretStore};

/// Secret store holding keys in memory
///
/// Used by tests and by deployments that configure keys through the API of a
/// fronting settings service rather than the environment.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<ProviderKind, String>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, provider: ProviderKind, api_key: impl Into<String>) -> Self {
        self.secrets
            .write()
            .unwrap()
            .insert(provider, api_key.into());
        self
    }

    pub fn set(&self, provider: ProviderKind, api_key: impl Into<String>) {
        self.secrets
            .write()
            .unwrap()
            .insert(provider, api_key.into());
    }

    pub fn remove(&self, provider: ProviderKind) {
        self.secrets.write().unwrap().remove(&provider);
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret(&self, provider: ProviderKind) -> Result<Option<String>, DomainError> {
        Ok(self.secrets.read().unwrap().get(&provider).cloned())
    }
}
