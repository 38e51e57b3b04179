//! Workflow error types

use thiserror::Error;

/// Errors that can occur during workflow operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Workflow not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Workflow is inactive: {0}")]
    Inactive(String),

    #[error("Workflow has no steps: {0}")]
    Empty(String),

    #[error("Step {index}: {message}")]
    InvalidStep { index: usize, message: String },
}

impl WorkflowError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn inactive(id: impl Into<String>) -> Self {
        Self::Inactive(id.into())
    }

    pub fn empty(id: impl Into<String>) -> Self {
        Self::Empty(id.into())
    }

    pub fn invalid_step(index: usize, message: impl Into<String>) -> Self {
        Self::InvalidStep {
            index,
            message: message.into(),
        }
    }
}

impl From<WorkflowError> for crate::domain::DomainError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound(id) => {
                Self::not_found(format!("Workflow not found: {}", id))
            }
            other => Self::validation(other.to_string()),
        }
    }
}
