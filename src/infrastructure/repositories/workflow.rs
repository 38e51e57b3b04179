//! In-memory workflow repository

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{DomainError, Workflow, WorkflowId, WorkflowRepository};

/// Workflow repository backed by a map
#[derive(Debug, Default)]
pub struct InMemoryWorkflowRepository {
    workflows: RwLock<HashMap<WorkflowId, Workflow>>,
}

impl InMemoryWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workflows(workflows: Vec<Workflow>) -> Self {
        let map = workflows
            .into_iter()
            .map(|w| (w.id().clone(), w))
            .collect();
        Self {
            workflows: RwLock::new(map),
        }
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn get(&self, id: &WorkflowId) -> Result<Option<Workflow>, DomainError> {
        Ok(self.workflows.read().unwrap().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Workflow>, DomainError> {
        let mut workflows: Vec<Workflow> =
            self.workflows.read().unwrap().values().cloned().collect();
        workflows.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        Ok(workflows)
    }

    async fn create(&self, workflow: Workflow) -> Result<Workflow, DomainError> {
        let mut workflows = self.workflows.write().unwrap();

        if workflows.contains_key(workflow.id()) {
            return Err(DomainError::conflict(format!(
                "Workflow '{}' already exists",
                workflow.id()
            )));
        }

        workflows.insert(workflow.id().clone(), workflow.clone());
        Ok(workflow)
    }

    async fn update(&self, workflow: &Workflow) -> Result<Workflow, DomainError> {
        let mut workflows = self.workflows.write().unwrap();

        if !workflows.contains_key(workflow.id()) {
            return Err(DomainError::not_found(format!(
                "Workflow not found: {}",
                workflow.id()
            )));
        }

        workflows.insert(workflow.id().clone(), workflow.clone());
        Ok(workflow.clone())
    }

    async fn delete(&self, id: &WorkflowId) -> Result<bool, DomainError> {
        Ok(self.workflows.write().unwrap().remove(id).is_some())
    }
}
