//! Agentflow - agentic workflow platform API
//!
//! The core of the service is the workflow run lifecycle: workflow
//! definitions are snapshotted into run records, executed step by step
//! against LLM provider adapters under a run-mode policy, and observed by
//! polling the run repository.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{
    AdapterFactory, ArtifactStore, Persona, PromptStep, ProviderKind, RunRepository, SecretStore,
    StepSpec, Workflow, WorkflowId, WorkflowRepository,
};
use engine::WorkflowEngine;
use infrastructure::{
    EnvSecretStore, FsArtifactStore, InMemoryRunRepository, InMemoryWorkflowRepository,
    ProviderAdapterFactory,
};

/// Wire up repositories, stores and the engine into the application state
pub fn create_app_state(config: &AppConfig) -> AppState {
    let workflows: Arc<dyn WorkflowRepository> = Arc::new(
        InMemoryWorkflowRepository::with_workflows(default_workflows()),
    );
    let runs: Arc<dyn RunRepository> = Arc::new(InMemoryRunRepository::new());
    let secrets: Arc<dyn SecretStore> = Arc::new(EnvSecretStore::default());
    let artifacts: Arc<dyn ArtifactStore> =
        Arc::new(FsArtifactStore::new(config.artifacts.root.clone()));
    let adapters: Arc<dyn AdapterFactory> = Arc::new(ProviderAdapterFactory::default());

    let engine = WorkflowEngine::new(
        workflows.clone(),
        runs.clone(),
        secrets,
        artifacts.clone(),
        adapters,
        config.test_run,
    );

    AppState {
        engine,
        workflows,
        runs,
        artifacts,
    }
}

/// Workflows seeded on startup
fn default_workflows() -> Vec<Workflow> {
    vec![
        Workflow::new(
            WorkflowId::new("learn-agentic-ai").unwrap(),
            "Learn Agentic AI",
        )
        .with_description("Guided study notes on an agentic AI concept")
        .with_persona(Persona::Student)
        .with_tags(vec!["ai".to_string(), "learning".to_string()])
        .with_step(StepSpec::Prompt(
            PromptStep::new(
                "Explain {{concept}} to a student in three short paragraphs.",
                ProviderKind::Gemini,
            )
            .with_system_prompt("You are a patient teacher.")
            .with_output_variable("explanation"),
        ))
        .with_step(StepSpec::Prompt(
            PromptStep::new(
                "Turn this explanation into five flashcard questions:\n\n{{explanation}}",
                ProviderKind::Gemini,
            )
            .with_output_variable("flashcards"),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workflows_are_valid() {
        let workflows = default_workflows();
        assert!(!workflows.is_empty());

        for workflow in &workflows {
            assert!(!workflow.is_empty());
            assert!(workflow.is_active());
        }
    }

    #[test]
    fn test_create_app_state() {
        let state = create_app_state(&AppConfig::default());
        assert!(std::sync::Arc::strong_count(&state.runs) >= 1);
    }
}
