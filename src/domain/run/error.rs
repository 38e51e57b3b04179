//! Run error types

use thiserror::Error;

use super::entity::RunStatus;

/// Errors from run lifecycle bookkeeping
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RunError {
    #[error("Run not found: {0}")]
    NotFound(String),

    #[error("Invalid run ID: {0}")]
    InvalidId(String),

    #[error("Cannot transition run from {from} to {to}")]
    InvalidTransition { from: RunStatus, to: RunStatus },
}

impl RunError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId(message.into())
    }

    pub fn invalid_transition(from: RunStatus, to: RunStatus) -> Self {
        Self::InvalidTransition { from, to }
    }
}

impl From<RunError> for crate::domain::DomainError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::NotFound(id) => Self::not_found(format!("Run not found: {}", id)),
            RunError::InvalidId(message) => Self::invalid_id(message),
            RunError::InvalidTransition { .. } => Self::conflict(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let err = RunError::invalid_transition(RunStatus::Completed, RunStatus::Running);
        assert_eq!(
            err.to_string(),
            "Cannot transition run from completed to running"
        );
    }
}
