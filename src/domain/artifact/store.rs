//! Artifact store trait

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

use super::{Artifact, ArtifactKind};
use crate::domain::run::RunId;
use crate::domain::DomainError;

/// Durable storage for run artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync + Debug {
    /// Persist one artifact and return its record
    async fn write(
        &self,
        run_id: &RunId,
        step_index: Option<usize>,
        kind: ArtifactKind,
        content: &Value,
    ) -> Result<Artifact, DomainError>;

    /// All artifacts recorded for a run, in write order
    async fn list_for_run(&self, run_id: &RunId) -> Result<Vec<Artifact>, DomainError>;

    /// Remove a run's artifacts (records and files); returns how many
    async fn delete_for_run(&self, run_id: &RunId) -> Result<usize, DomainError>;
}
