//! Secret store seam
//!
//! The engine reads API keys through this trait and never persists or logs
//! them. Encryption at rest is the backing store's concern, not the engine's.

use std::fmt::Debug;

use async_trait::async_trait;

use super::provider::ProviderKind;
use super::DomainError;

/// Read-only access to provider API keys
#[async_trait]
pub trait SecretStore: Send + Sync + Debug {
    /// Decrypted API key for a provider, or `None` if unconfigured
    async fn get_secret(&self, provider: ProviderKind) -> Result<Option<String>, DomainError>;
}
