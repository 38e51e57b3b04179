//! Infrastructure layer: concrete implementations of the domain's trait
//! seams - HTTP transport, provider adapters, repositories, secret stores
//! and the artifact store.

pub mod artifacts;
pub mod http;
pub mod providers;
pub mod repositories;
pub mod secrets;

pub use artifacts::FsArtifactStore;
pub use http::HttpClient;
pub use providers::ProviderAdapterFactory;
pub use repositories::{InMemoryRunRepository, InMemoryWorkflowRepository};
pub use secrets::{EnvSecretStore, InMemorySecretStore};
