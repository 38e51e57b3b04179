//! Run endpoints
//!
//! Creating a run returns 202 immediately; execution happens in a detached
//! task and clients poll `GET /v1/runs/{id}` for progress.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::error::ApiError;
use super::state::AppState;
use crate::domain::{
    Artifact, Run, RunError, RunFilter, RunId, RunMetrics, RunMode, RunStatus, WorkflowError,
    WorkflowId,
};

/// Request to create and launch a run
#[derive(Debug, Clone, Deserialize)]
pub struct RunCreateRequest {
    pub workflow_id: String,
    pub mode: RunMode,
    #[serde(default)]
    pub input_data: Map<String, Value>,
}

/// Run resource representation
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub id: String,
    pub workflow_id: String,
    pub status: RunStatus,
    pub mode: RunMode,
    pub input_data: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<RunMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Run> for RunResponse {
    fn from(run: &Run) -> Self {
        Self {
            id: run.id().to_string(),
            workflow_id: run.workflow_id().to_string(),
            status: run.status(),
            mode: run.mode(),
            input_data: run.input_data().clone(),
            output_data: run.output_data().cloned(),
            metrics: run.metrics().copied(),
            error_message: run.error_message().map(str::to_string),
            created_at: run.created_at(),
            started_at: run.started_at(),
            completed_at: run.completed_at(),
        }
    }
}

/// Artifact resource representation
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactResponse {
    pub id: String,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    pub kind: String,
    pub file_name: String,
    pub file_path: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Artifact> for ArtifactResponse {
    fn from(artifact: &Artifact) -> Self {
        Self {
            id: artifact.id().to_string(),
            run_id: artifact.run_id().to_string(),
            step_index: artifact.step_index(),
            kind: artifact.kind().to_string(),
            file_name: artifact.file_name().to_string(),
            file_path: artifact.file_path().to_string(),
            size_bytes: artifact.size_bytes(),
            mime_type: artifact.mime_type().to_string(),
            created_at: artifact.created_at(),
        }
    }
}

/// Query parameters for listing runs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunListParams {
    pub workflow_id: Option<String>,
    pub status: Option<RunStatus>,
    pub limit: Option<usize>,
}

/// POST /v1/runs - create a run and launch it in the background
pub async fn create_run(
    State(state): State<AppState>,
    Json(request): Json<RunCreateRequest>,
) -> Result<Response, ApiError> {
    let workflow_id = WorkflowId::new(request.workflow_id)
        .map_err(|e: WorkflowError| ApiError::bad_request(e.to_string()))?;

    debug!(workflow_id = %workflow_id, mode = %request.mode, "Creating run");

    let run = state
        .engine
        .create_and_launch(workflow_id, request.input_data, request.mode)
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::ACCEPTED, Json(RunResponse::from(&run))).into_response())
}

/// GET /v1/runs - list runs, newest first
pub async fn list_runs(
    State(state): State<AppState>,
    Query(params): Query<RunListParams>,
) -> Result<Json<Vec<RunResponse>>, ApiError> {
    let workflow_id = match params.workflow_id {
        Some(raw) => Some(
            WorkflowId::new(raw).map_err(|e: WorkflowError| ApiError::bad_request(e.to_string()))?,
        ),
        None => None,
    };

    let filter = RunFilter {
        workflow_id,
        status: params.status,
        limit: Some(params.limit.unwrap_or(100)),
    };

    let runs = state.runs.list(&filter).await.map_err(ApiError::from)?;
    Ok(Json(runs.iter().map(RunResponse::from).collect()))
}

/// GET /v1/runs/{id}
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunResponse>, ApiError> {
    let run_id = parse_run_id(id)?;

    let run = state
        .runs
        .get(&run_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Run not found: {}", run_id)))?;

    Ok(Json(RunResponse::from(&run)))
}

/// DELETE /v1/runs/{id} - cascades to the run's artifacts
pub async fn delete_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let run_id = parse_run_id(id)?;

    state
        .artifacts
        .delete_for_run(&run_id)
        .await
        .map_err(ApiError::from)?;

    let deleted = state.runs.delete(&run_id).await.map_err(ApiError::from)?;
    if !deleted {
        return Err(ApiError::not_found(format!("Run not found: {}", run_id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/runs/{id}/artifacts
pub async fn list_run_artifacts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ArtifactResponse>>, ApiError> {
    let run_id = parse_run_id(id)?;

    if state
        .runs
        .get(&run_id)
        .await
        .map_err(ApiError::from)?
        .is_none()
    {
        return Err(ApiError::not_found(format!("Run not found: {}", run_id)));
    }

    let artifacts = state
        .artifacts
        .list_for_run(&run_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(artifacts.iter().map(ArtifactResponse::from).collect()))
}

fn parse_run_id(raw: String) -> Result<RunId, ApiError> {
    RunId::new(raw).map_err(|e: RunError| ApiError::bad_request(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_deserialization() {
        let request: RunCreateRequest = serde_json::from_value(json!({
            "workflow_id": "learn-agentic-ai",
            "mode": "test_run",
            "input_data": { "topic": "llm evaluation" }
        }))
        .unwrap();

        assert_eq!(request.workflow_id, "learn-agentic-ai");
        assert_eq!(request.mode, RunMode::TestRun);
        assert_eq!(request.input_data["topic"], "llm evaluation");
    }

    #[test]
    fn test_create_request_defaults_inputs() {
        let request: RunCreateRequest = serde_json::from_value(json!({
            "workflow_id": "wf",
            "mode": "validate_only"
        }))
        .unwrap();

        assert!(request.input_data.is_empty());
    }

    #[test]
    fn test_run_response_shape() {
        let run = Run::new(
            WorkflowId::new("wf").unwrap(),
            RunMode::FullRun,
            Map::new(),
            Vec::new(),
        );

        let response = RunResponse::from(&run);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "queued");
        assert_eq!(json["mode"], "full_run");
        assert!(json.get("output_data").is_none());
        assert!(json.get("error_message").is_none());
    }
}
