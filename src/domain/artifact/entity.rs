//! Artifact domain entities

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::run::RunId;

/// Artifact identifier (art-{uuid})
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Generate a new artifact ID with UUID
    pub fn generate() -> Self {
        Self(format!("art-{}", uuid::Uuid::new_v4()))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an artifact file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Rendered prompt sent to a provider
    Prompt,

    /// Raw provider response
    Response,

    /// Full execution trace of the run
    Trace,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Response => "response",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted output file associated with one run
///
/// Written once, never mutated, deleted with the parent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    id: ArtifactId,
    run_id: RunId,

    /// Step that produced the artifact; `None` for run-level artifacts
    #[serde(skip_serializing_if = "Option::is_none")]
    step_index: Option<usize>,

    kind: ArtifactKind,
    file_name: String,
    file_path: String,
    size_bytes: u64,
    mime_type: String,
    created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        run_id: RunId,
        step_index: Option<usize>,
        kind: ArtifactKind,
        file_name: impl Into<String>,
        file_path: impl Into<String>,
        size_bytes: u64,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: ArtifactId::generate(),
            run_id,
            step_index,
            kind,
            file_name: file_name.into(),
            file_path: file_path.into(),
            size_bytes,
            mime_type: mime_type.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &ArtifactId {
        &self.id
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn step_index(&self) -> Option<usize> {
        self.step_index
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
