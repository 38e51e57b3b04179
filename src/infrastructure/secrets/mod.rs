//! Secret store implementations

pub mod env;
pub mod memory;

pub use env::EnvSecretStore;
pub use memory::InMemorySecretStore;
