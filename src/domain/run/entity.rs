//! Run domain entities
//!
//! A run is one execution attempt of a workflow. It snapshots the workflow's
//! step list at creation time so the record stays reproducible when the
//! definition is later edited or deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::RunError;
use crate::domain::workflow::{StepSpec, WorkflowId};

/// Regex pattern for valid run IDs: run-{uuid}
static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^run-[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$").unwrap()
});

/// Maximum length for run IDs ("run-" + 36 char UUID)
pub const MAX_ID_LENGTH: usize = 40;

/// Validated run identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(String);

impl RunId {
    /// Create a new validated run ID
    pub fn new(id: impl Into<String>) -> Result<Self, RunError> {
        let id = id.into();
        validate_run_id(&id)?;
        Ok(Self(id))
    }

    /// Generate a new run ID with UUID
    pub fn generate() -> Self {
        let uuid = uuid::Uuid::new_v4();
        Self(format!("run-{}", uuid))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RunId {
    type Error = RunError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a run ID string
pub fn validate_run_id(id: &str) -> Result<(), RunError> {
    if id.is_empty() {
        return Err(RunError::invalid_id("Run ID cannot be empty"));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(RunError::invalid_id(format!(
            "Run ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(RunError::invalid_id(format!(
            "Invalid run ID '{}': must be in format run-{{uuid}}",
            id
        )));
    }

    Ok(())
}

/// Run execution status - the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, execution not yet picked up
    #[default]
    Queued,

    /// Preflight validation in progress
    Validating,

    /// Steps executing
    Running,

    /// All steps executed, output written
    Completed,

    /// Aborted with an error
    Failed,

    /// Declared for API completeness; the engine never produces it
    Cancelled,
}

impl RunStatus {
    /// Check if this status represents a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if this status can transition to another status
    ///
    /// Transitions are monotonic: queued -> validating -> running ->
    /// {completed, failed}; any non-terminal state may fail or be cancelled.
    pub fn can_transition_to(&self, target: RunStatus) -> bool {
        match (self, target) {
            (Self::Queued, Self::Validating) => true,
            (Self::Queued, Self::Failed) => true,
            (Self::Queued, Self::Cancelled) => true,

            (Self::Validating, Self::Running) => true,
            (Self::Validating, Self::Failed) => true,
            (Self::Validating, Self::Cancelled) => true,

            (Self::Running, Self::Completed) => true,
            (Self::Running, Self::Failed) => true,
            (Self::Running, Self::Cancelled) => true,

            _ => false,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Validating => write!(f, "validating"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Run execution mode, bounding what an execution is permitted to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Preflight checks only, no generation calls
    ValidateOnly,

    /// Smoke test under strict token/time/step caps
    TestRun,

    /// Complete execution, no caps
    FullRun,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidateOnly => write!(f, "validate_only"),
            Self::TestRun => write!(f, "test_run"),
            Self::FullRun => write!(f, "full_run"),
        }
    }
}

/// Execution metrics accumulated over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub duration_ms: u64,
    pub steps_executed: usize,
}

/// One execution attempt of a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique run identifier
    id: RunId,

    /// Workflow this run was created from
    workflow_id: WorkflowId,

    /// Execution mode
    mode: RunMode,

    /// Current status
    status: RunStatus,

    /// User-provided inputs
    input_data: Map<String, Value>,

    /// Step list snapshotted from the workflow at creation time
    steps: Vec<StepSpec>,

    /// Final output, present exactly when status is completed
    #[serde(skip_serializing_if = "Option::is_none")]
    output_data: Option<Value>,

    /// Execution metrics, written together with the terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<RunMetrics>,

    /// Failure cause, present exactly when status is failed
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,

    /// When the run was created
    created_at: DateTime<Utc>,

    /// When execution was picked up
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,

    /// When the run reached a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Create a new queued run with a snapshot of the workflow's steps
    pub fn new(
        workflow_id: WorkflowId,
        mode: RunMode,
        input_data: Map<String, Value>,
        steps: Vec<StepSpec>,
    ) -> Self {
        Self {
            id: RunId::generate(),
            workflow_id,
            mode,
            status: RunStatus::Queued,
            input_data,
            steps,
            output_data: None,
            metrics: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    // Getters

    pub fn id(&self) -> &RunId {
        &self.id
    }

    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn input_data(&self) -> &Map<String, Value> {
        &self.input_data
    }

    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    pub fn output_data(&self) -> Option<&Value> {
        self.output_data.as_ref()
    }

    pub fn metrics(&self) -> Option<&RunMetrics> {
        self.metrics.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    // State transitions

    /// Mark the run as validating (execution picked up)
    pub fn mark_validating(&mut self) -> Result<(), RunError> {
        self.transition(RunStatus::Validating)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the run as running (validation passed)
    pub fn mark_running(&mut self) -> Result<(), RunError> {
        self.transition(RunStatus::Running)
    }

    /// Mark the run as completed, writing output and metrics atomically
    /// with the status flip
    pub fn mark_completed(&mut self, output: Value, metrics: RunMetrics) -> Result<(), RunError> {
        self.transition(RunStatus::Completed)?;
        self.output_data = Some(output);
        self.metrics = Some(metrics);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the run as failed with a human-readable cause
    ///
    /// No partial output is committed; metrics collected so far may be kept
    /// for diagnostics.
    pub fn mark_failed(
        &mut self,
        error: impl Into<String>,
        metrics: Option<RunMetrics>,
    ) -> Result<(), RunError> {
        self.transition(RunStatus::Failed)?;
        self.error_message = Some(error.into());
        self.metrics = metrics;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, target: RunStatus) -> Result<(), RunError> {
        if !self.status.can_transition_to(target) {
            return Err(RunError::invalid_transition(self.status, target));
        }
        self.status = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_run() -> Run {
        Run::new(
            WorkflowId::new("test-workflow").unwrap(),
            RunMode::FullRun,
            Map::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_run_id_generate() {
        let id = RunId::generate();
        assert!(id.as_str().starts_with("run-"));
        assert_eq!(id.as_str().len(), 40);
    }

    #[test]
    fn test_run_id_invalid() {
        assert!(RunId::new("").is_err());
        assert!(RunId::new("invalid").is_err());
        assert!(RunId::new("run-invalid").is_err());
        assert!(RunId::new("12345678-1234-1234-1234-123456789abc").is_err());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::Validating.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_transitions_monotonic() {
        assert!(RunStatus::Queued.can_transition_to(RunStatus::Validating));
        assert!(!RunStatus::Queued.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Queued.can_transition_to(RunStatus::Completed));

        assert!(RunStatus::Validating.can_transition_to(RunStatus::Running));
        assert!(RunStatus::Validating.can_transition_to(RunStatus::Failed));
        assert!(!RunStatus::Validating.can_transition_to(RunStatus::Completed));

        assert!(RunStatus::Running.can_transition_to(RunStatus::Completed));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Failed));

        assert!(!RunStatus::Completed.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Failed.can_transition_to(RunStatus::Validating));
        assert!(!RunStatus::Cancelled.can_transition_to(RunStatus::Running));
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = test_run();
        assert_eq!(run.status(), RunStatus::Queued);
        assert!(run.started_at().is_none());

        run.mark_validating().unwrap();
        assert_eq!(run.status(), RunStatus::Validating);
        assert!(run.started_at().is_some());

        run.mark_running().unwrap();
        assert_eq!(run.status(), RunStatus::Running);

        let metrics = RunMetrics {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
            duration_ms: 1200,
            steps_executed: 2,
        };
        run.mark_completed(json!({"final": "output"}), metrics)
            .unwrap();

        assert_eq!(run.status(), RunStatus::Completed);
        assert!(run.output_data().is_some());
        assert!(run.error_message().is_none());
        assert_eq!(run.metrics().unwrap().steps_executed, 2);
        assert!(run.completed_at().is_some());
    }

    #[test]
    fn test_run_failure_from_validating() {
        let mut run = test_run();
        run.mark_validating().unwrap();
        run.mark_failed("no API key configured for provider 'gemini'", None)
            .unwrap();

        assert_eq!(run.status(), RunStatus::Failed);
        assert!(run.output_data().is_none());
        assert!(run.error_message().unwrap().contains("gemini"));
    }

    #[test]
    fn test_terminal_runs_reject_transitions() {
        let mut run = test_run();
        run.mark_validating().unwrap();
        run.mark_running().unwrap();
        run.mark_completed(json!({}), RunMetrics::default()).unwrap();

        assert!(run.mark_running().is_err());
        assert!(run.mark_failed("late failure", None).is_err());
    }

    #[test]
    fn test_cannot_complete_without_running() {
        let mut run = test_run();
        assert!(run
            .mark_completed(json!({}), RunMetrics::default())
            .is_err());

        run.mark_validating().unwrap();
        assert!(run
            .mark_completed(json!({}), RunMetrics::default())
            .is_err());
    }

    #[test]
    fn test_run_serialization() {
        let run = test_run();
        let json = serde_json::to_string(&run).unwrap();
        assert!(json.contains("\"status\":\"queued\""));
        assert!(json.contains("\"mode\":\"full_run\""));
        assert!(!json.contains("output_data"));

        let deserialized: Run = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id(), run.id());
        assert_eq!(deserialized.status(), RunStatus::Queued);
    }
}
