//! Shared application state for the API layer

use std::sync::Arc;

use crate::domain::{ArtifactStore, RunRepository, WorkflowRepository};
use crate::engine::WorkflowEngine;

/// State handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: WorkflowEngine,
    pub workflows: Arc<dyn WorkflowRepository>,
    pub runs: Arc<dyn RunRepository>,
    pub artifacts: Arc<dyn ArtifactStore>,
}
