//! Run repository trait
//!
//! The repository is the single source of truth for run state. The engine's
//! background task is the only writer for a given run; clients observe
//! progress by polling `get`.

use std::fmt::Debug;

use async_trait::async_trait;

use super::{Run, RunId, RunStatus};
use crate::domain::workflow::WorkflowId;
use crate::domain::DomainError;

/// Filters for listing runs
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub workflow_id: Option<WorkflowId>,
    pub status: Option<RunStatus>,
    pub limit: Option<usize>,
}

/// Repository for run records
#[async_trait]
pub trait RunRepository: Send + Sync + Debug {
    /// Get a run by ID
    async fn get(&self, id: &RunId) -> Result<Option<Run>, DomainError>;

    /// Create a new run
    async fn create(&self, run: Run) -> Result<Run, DomainError>;

    /// Persist the current state of an existing run
    async fn update(&self, run: &Run) -> Result<Run, DomainError>;

    /// Delete a run by ID, returns true if deleted
    async fn delete(&self, id: &RunId) -> Result<bool, DomainError>;

    /// List runs matching a filter, newest first
    async fn list(&self, filter: &RunFilter) -> Result<Vec<Run>, DomainError>;
}
