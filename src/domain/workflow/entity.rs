//! Workflow domain entity

use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::WorkflowError;
use super::step::StepSpec;

/// Maximum length for workflow IDs
pub const MAX_ID_LENGTH: usize = 50;

/// Regex pattern for valid workflow IDs: alphanumeric, hyphens and underscores
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$").unwrap());

/// Validated workflow identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Create a new validated workflow ID
    pub fn new(id: impl Into<String>) -> Result<Self, WorkflowError> {
        let id = id.into();
        validate_workflow_id(&id)?;
        Ok(Self(id))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorkflowId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkflowId> for String {
    fn from(id: WorkflowId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkflowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a workflow ID string
pub fn validate_workflow_id(id: &str) -> Result<(), WorkflowError> {
    if id.is_empty() {
        return Err(WorkflowError::validation("Workflow ID cannot be empty"));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(WorkflowError::validation(format!(
            "Workflow ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(WorkflowError::validation(format!(
            "Invalid workflow ID '{}': must be alphanumeric with hyphens or underscores, start and end with alphanumeric",
            id
        )));
    }

    Ok(())
}

/// User persona a workflow is categorized under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    #[default]
    Student,
    Researcher,
    MlEngineer,
    DataScientist,
    AiArchitect,
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Researcher => write!(f, "researcher"),
            Self::MlEngineer => write!(f, "ml_engineer"),
            Self::DataScientist => write!(f, "data_scientist"),
            Self::AiArchitect => write!(f, "ai_architect"),
        }
    }
}

/// A workflow definition
///
/// Definitions are templates: a step may reference a provider whose secret is
/// not configured yet. That is only checked when a run validates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier
    id: WorkflowId,

    /// Human-readable name
    name: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    /// Persona the workflow targets
    #[serde(default)]
    persona: Persona,

    /// Ordered list of step specifications
    steps: Vec<StepSpec>,

    /// Whether the workflow may be run
    active: bool,

    /// Free-form tags
    #[serde(default)]
    tags: Vec<String>,

    /// Definition version (increments when steps change)
    version: u32,

    /// When the workflow was created
    created_at: DateTime<Utc>,

    /// When the workflow was last updated
    updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Create a new workflow
    pub fn new(id: WorkflowId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: None,
            persona: Persona::default(),
            steps: Vec::new(),
            active: true,
            tags: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    // Builder methods

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_steps(mut self, steps: Vec<StepSpec>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    // Getters

    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    // Setters (mutate and update timestamp)

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    pub fn set_persona(&mut self, persona: Persona) {
        self.persona = persona;
        self.touch();
    }

    pub fn set_steps(&mut self, steps: Vec<StepSpec>) {
        self.steps = steps;
        self.increment_version();
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.touch();
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn increment_version(&mut self) {
        self.version += 1;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::ProviderKind;
    use crate::domain::workflow::step::PromptStep;

    #[test]
    fn test_workflow_id_valid() {
        assert!(WorkflowId::new("learn-agentic-ai").is_ok());
        assert!(WorkflowId::new("learn_agentic_ai").is_ok());
        assert!(WorkflowId::new("workflow123").is_ok());
        assert!(WorkflowId::new("a").is_ok());
    }

    #[test]
    fn test_workflow_id_invalid() {
        assert!(WorkflowId::new("").is_err());
        assert!(WorkflowId::new("-invalid").is_err());
        assert!(WorkflowId::new("invalid-").is_err());
        assert!(WorkflowId::new("has spaces").is_err());

        let long_id = "a".repeat(51);
        assert!(WorkflowId::new(long_id).is_err());
    }

    #[test]
    fn test_workflow_creation() {
        let id = WorkflowId::new("test").unwrap();
        let workflow = Workflow::new(id, "Test Workflow")
            .with_description("A test workflow")
            .with_persona(Persona::Researcher)
            .with_tags(vec!["ai".to_string(), "learning".to_string()]);

        assert_eq!(workflow.id().as_str(), "test");
        assert_eq!(workflow.name(), "Test Workflow");
        assert_eq!(workflow.persona(), Persona::Researcher);
        assert!(workflow.is_active());
        assert_eq!(workflow.version(), 1);
        assert!(workflow.is_empty());
    }

    #[test]
    fn test_workflow_step_change_increments_version() {
        let id = WorkflowId::new("versioned").unwrap();
        let mut workflow = Workflow::new(id, "Versioned");
        assert_eq!(workflow.version(), 1);

        workflow.set_steps(vec![StepSpec::Prompt(PromptStep::new(
            "Hello",
            ProviderKind::OpenAi,
        ))]);

        assert_eq!(workflow.version(), 2);
        assert_eq!(workflow.step_count(), 1);
    }

    #[test]
    fn test_workflow_serialization() {
        let id = WorkflowId::new("serializable").unwrap();
        let workflow = Workflow::new(id, "Serializable Workflow").with_step(StepSpec::Prompt(
            PromptStep::new("Summarize {{topic}}", ProviderKind::Gemini),
        ));

        let json = serde_json::to_string_pretty(&workflow).unwrap();
        assert!(json.contains("\"id\": \"serializable\""));
        assert!(json.contains("\"persona\": \"student\""));
        assert!(json.contains("\"type\": \"prompt\""));

        let deserialized: Workflow = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id().as_str(), "serializable");
        assert_eq!(deserialized.step_count(), 1);
    }
}
