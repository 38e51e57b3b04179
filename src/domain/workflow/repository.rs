//! Workflow repository trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::{Workflow, WorkflowId};
use crate::domain::DomainError;

/// Repository for workflow definitions
#[async_trait]
pub trait WorkflowRepository: Send + Sync + Debug {
    /// Get a workflow by ID
    async fn get(&self, id: &WorkflowId) -> Result<Option<Workflow>, DomainError>;

    /// List all workflows
    async fn list(&self) -> Result<Vec<Workflow>, DomainError>;

    /// Create a new workflow, error if the ID already exists
    async fn create(&self, workflow: Workflow) -> Result<Workflow, DomainError>;

    /// Update an existing workflow, error if not found
    async fn update(&self, workflow: &Workflow) -> Result<Workflow, DomainError>;

    /// Delete a workflow by ID, returns true if deleted
    ///
    /// Runs are not cascaded: they carry their own snapshot of the step list
    /// and stay queryable after the definition is gone.
    async fn delete(&self, id: &WorkflowId) -> Result<bool, DomainError>;
}
