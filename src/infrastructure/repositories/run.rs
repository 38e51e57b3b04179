//! In-memory run repository

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{DomainError, Run, RunFilter, RunId, RunRepository};

/// Run repository backed by a map
#[derive(Debug, Default)]
pub struct InMemoryRunRepository {
    runs: RwLock<HashMap<RunId, Run>>,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn get(&self, id: &RunId) -> Result<Option<Run>, DomainError> {
        Ok(self.runs.read().unwrap().get(id).cloned())
    }

    async fn create(&self, run: Run) -> Result<Run, DomainError> {
        let mut runs = self.runs.write().unwrap();

        if runs.contains_key(run.id()) {
            return Err(DomainError::conflict(format!(
                "Run '{}' already exists",
                run.id()
            )));
        }

        runs.insert(run.id().clone(), run.clone());
        Ok(run)
    }

    async fn update(&self, run: &Run) -> Result<Run, DomainError> {
        let mut runs = self.runs.write().unwrap();

        if !runs.contains_key(run.id()) {
            return Err(DomainError::not_found(format!("Run not found: {}", run.id())));
        }

        runs.insert(run.id().clone(), run.clone());
        Ok(run.clone())
    }

    async fn delete(&self, id: &RunId) -> Result<bool, DomainError> {
        Ok(self.runs.write().unwrap().remove(id).is_some())
    }

    async fn list(&self, filter: &RunFilter) -> Result<Vec<Run>, DomainError> {
        let runs = self.runs.read().unwrap();

        let mut matching: Vec<Run> = runs
            .values()
            .filter(|run| {
                filter
                    .workflow_id
                    .as_ref()
                    .is_none_or(|id| run.workflow_id() == id)
                    && filter.status.is_none_or(|status| run.status() == status)
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }

        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RunMode, RunStatus, WorkflowId};
    use serde_json::Map;

    fn run_for(workflow: &str) -> Run {
        Run::new(
            WorkflowId::new(workflow).unwrap(),
            RunMode::FullRun,
            Map::new(),
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let repo = InMemoryRunRepository::new();
        let run = repo.create(run_for("wf")).await.unwrap();

        let mut fetched = repo.get(run.id()).await.unwrap().unwrap();
        assert_eq!(fetched.status(), RunStatus::Queued);

        fetched.mark_validating().unwrap();
        repo.update(&fetched).await.unwrap();

        let reloaded = repo.get(run.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.status(), RunStatus::Validating);
    }

    #[tokio::test]
    async fn test_get_returns_stable_content_after_terminal() {
        let repo = InMemoryRunRepository::new();
        let mut run = repo.create(run_for("wf")).await.unwrap();

        run.mark_validating().unwrap();
        run.mark_running().unwrap();
        run.mark_completed(serde_json::json!({"ok": true}), Default::default())
            .unwrap();
        repo.update(&run).await.unwrap();

        let first = repo.get(run.id()).await.unwrap().unwrap();
        let second = repo.get(run.id()).await.unwrap().unwrap();
        assert_eq!(first.status(), second.status());
        assert_eq!(first.output_data(), second.output_data());
        assert_eq!(first.completed_at(), second.completed_at());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let repo = InMemoryRunRepository::new();
        repo.create(run_for("alpha")).await.unwrap();
        repo.create(run_for("alpha")).await.unwrap();
        repo.create(run_for("beta")).await.unwrap();

        let filter = RunFilter {
            workflow_id: Some(WorkflowId::new("alpha").unwrap()),
            ..Default::default()
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);

        let filter = RunFilter {
            status: Some(RunStatus::Completed),
            ..Default::default()
        };
        assert!(repo.list(&filter).await.unwrap().is_empty());

        let filter = RunFilter {
            limit: Some(1),
            ..Default::default()
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryRunRepository::new();
        let run = repo.create(run_for("wf")).await.unwrap();

        assert!(repo.delete(run.id()).await.unwrap());
        assert!(!repo.delete(run.id()).await.unwrap());
        assert!(repo.get(run.id()).await.unwrap().is_none());
    }
}
