//! Filesystem artifact store
//!
//! Artifact content lives under `<root>/<run_id>/`; the records describing
//! the files are kept in memory alongside the in-memory repositories. Files
//! are pretty-printed JSON so they are readable straight off disk.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::{Artifact, ArtifactKind, ArtifactStore, DomainError, RunId};

/// Artifact store writing JSON files under a root directory
#[derive(Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
    records: RwLock<HashMap<RunId, Vec<Artifact>>>,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            records: RwLock::new(HashMap::new()),
        }
    }

    fn file_name(step_index: Option<usize>, kind: ArtifactKind) -> String {
        match step_index {
            Some(index) => format!("step_{}_{}.json", index, kind),
            None => format!("{}.json", kind),
        }
    }

    fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.root.join(run_id.as_str())
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn write(
        &self,
        run_id: &RunId,
        step_index: Option<usize>,
        kind: ArtifactKind,
        content: &Value,
    ) -> Result<Artifact, DomainError> {
        let dir = self.run_dir(run_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::storage(format!("cannot create artifact dir: {}", e)))?;

        let file_name = Self::file_name(step_index, kind);
        let path = dir.join(&file_name);

        let bytes = serde_json::to_vec_pretty(content)
            .map_err(|e| DomainError::storage(format!("cannot serialize artifact: {}", e)))?;
        let size_bytes = bytes.len() as u64;

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| DomainError::storage(format!("cannot write artifact: {}", e)))?;

        let mime_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let artifact = Artifact::new(
            run_id.clone(),
            step_index,
            kind,
            file_name,
            path.to_string_lossy().to_string(),
            size_bytes,
            mime_type,
        );

        debug!(
            run_id = %run_id,
            kind = %kind,
            size_bytes,
            "Artifact written"
        );

        self.records
            .write()
            .unwrap()
            .entry(run_id.clone())
            .or_default()
            .push(artifact.clone());

        Ok(artifact)
    }

    async fn list_for_run(&self, run_id: &RunId) -> Result<Vec<Artifact>, DomainError> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(run_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_for_run(&self, run_id: &RunId) -> Result<usize, DomainError> {
        let removed = self
            .records
            .write()
            .unwrap()
            .remove(run_id)
            .map(|artifacts| artifacts.len())
            .unwrap_or(0);

        let dir = self.run_dir(run_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "cannot remove artifact dir: {}",
                    e
                )))
            }
        }

        Ok(removed)
    }
}
