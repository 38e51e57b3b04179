//! Workflow CRUD endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ApiError;
use super::state::AppState;
use crate::domain::{Persona, StepSpec, Workflow, WorkflowError, WorkflowId};

/// Request to create a workflow
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowCreateRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub persona: Persona,
    pub steps: Vec<StepSpec>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request to update a workflow; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub persona: Option<Persona>,
    pub steps: Option<Vec<StepSpec>>,
    pub active: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Workflow resource representation
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub persona: Persona,
    pub steps: Vec<StepSpec>,
    pub active: bool,
    pub tags: Vec<String>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Workflow> for WorkflowResponse {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id().to_string(),
            name: workflow.name().to_string(),
            description: workflow.description().map(str::to_string),
            persona: workflow.persona(),
            steps: workflow.steps().to_vec(),
            active: workflow.is_active(),
            tags: workflow.tags().to_vec(),
            version: workflow.version(),
            created_at: workflow.created_at(),
            updated_at: workflow.updated_at(),
        }
    }
}

/// POST /v1/workflows
pub async fn create_workflow(
    State(state): State<AppState>,
    Json(request): Json<WorkflowCreateRequest>,
) -> Result<Response, ApiError> {
    let id = parse_workflow_id(request.id)?;

    if request.steps.is_empty() {
        return Err(ApiError::bad_request("Workflow must have at least one step"));
    }

    let mut workflow = Workflow::new(id, request.name)
        .with_persona(request.persona)
        .with_steps(request.steps)
        .with_tags(request.tags);

    if let Some(description) = request.description {
        workflow = workflow.with_description(description);
    }

    debug!(workflow_id = %workflow.id(), steps = workflow.step_count(), "Creating workflow");

    let created = state
        .workflows
        .create(workflow)
        .await
        .map_err(ApiError::from)?;

    Ok((StatusCode::CREATED, Json(WorkflowResponse::from(&created))).into_response())
}

/// GET /v1/workflows
pub async fn list_workflows(
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkflowResponse>>, ApiError> {
    let workflows = state.workflows.list().await.map_err(ApiError::from)?;
    Ok(Json(workflows.iter().map(WorkflowResponse::from).collect()))
}

/// GET /v1/workflows/{id}
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let id = parse_workflow_id(id)?;

    let workflow = state
        .workflows
        .get(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Workflow not found: {}", id)))?;

    Ok(Json(WorkflowResponse::from(&workflow)))
}

/// PUT /v1/workflows/{id}
pub async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<WorkflowUpdateRequest>,
) -> Result<Json<WorkflowResponse>, ApiError> {
    let id = parse_workflow_id(id)?;

    let mut workflow = state
        .workflows
        .get(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("Workflow not found: {}", id)))?;

    if let Some(name) = request.name {
        workflow.set_name(name);
    }
    if let Some(description) = request.description {
        workflow.set_description(Some(description));
    }
    if let Some(persona) = request.persona {
        workflow.set_persona(persona);
    }
    if let Some(steps) = request.steps {
        if steps.is_empty() {
            return Err(ApiError::bad_request("Workflow must have at least one step"));
        }
        workflow.set_steps(steps);
    }
    if let Some(active) = request.active {
        workflow.set_active(active);
    }
    if let Some(tags) = request.tags {
        workflow.set_tags(tags);
    }

    let updated = state
        .workflows
        .update(&workflow)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(WorkflowResponse::from(&updated)))
}

/// DELETE /v1/workflows/{id}
///
/// Historical runs are untouched: they carry their own step snapshot.
pub async fn delete_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_workflow_id(id)?;

    let deleted = state.workflows.delete(&id).await.map_err(ApiError::from)?;
    if !deleted {
        return Err(ApiError::not_found(format!("Workflow not found: {}", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn parse_workflow_id(raw: String) -> Result<WorkflowId, ApiError> {
    WorkflowId::new(raw).map_err(|e: WorkflowError| ApiError::bad_request(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_deserialization() {
        let request: WorkflowCreateRequest = serde_json::from_value(json!({
            "id": "learn-agentic-ai",
            "name": "Learn Agentic AI",
            "persona": "student",
            "steps": [
                {
                    "type": "prompt",
                    "template": "Explain {{concept}}",
                    "provider": "gemini"
                }
            ],
            "tags": ["ai", "learning"]
        }))
        .unwrap();

        assert_eq!(request.id, "learn-agentic-ai");
        assert_eq!(request.persona, Persona::Student);
        assert_eq!(request.steps.len(), 1);
    }

    #[test]
    fn test_update_request_partial() {
        let request: WorkflowUpdateRequest =
            serde_json::from_value(json!({ "active": false })).unwrap();

        assert_eq!(request.active, Some(false));
        assert!(request.name.is_none());
        assert!(request.steps.is_none());
    }
}
