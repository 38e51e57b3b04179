//! Workflow engine
//!
//! Owns the run lifecycle: snapshots a workflow into a queued run, spawns a
//! detached execution task, and drives that run through validating, running
//! and a terminal status. All communication back to callers goes through the
//! run repository; the execution context never leaves the task.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use super::context::{ExecutionContext, StepOutput};
use super::error::EngineError;
use super::limits::RunLimits;
use super::validation::{self, AdapterMap, ValidationReport};
use crate::config::TestRunLimitsConfig;
use crate::domain::{
    AdapterFactory, ArtifactKind, ArtifactStore, CompletionRequest, DomainError, PromptStep, Run,
    RunId, RunMetrics, RunMode, RunRepository, RunStatus, SecretStore, StepSpec,
    TransformFunction, TransformStep, Usage, ValidateStep, ValidationRule, WorkflowId,
    WorkflowRepository,
};

/// Temperature used when a prompt step does not set one
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The workflow execution engine
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    workflows: Arc<dyn WorkflowRepository>,
    runs: Arc<dyn RunRepository>,
    secrets: Arc<dyn SecretStore>,
    artifacts: Arc<dyn ArtifactStore>,
    adapters: Arc<dyn AdapterFactory>,
    limits: TestRunLimitsConfig,
}

impl WorkflowEngine {
    pub fn new(
        workflows: Arc<dyn WorkflowRepository>,
        runs: Arc<dyn RunRepository>,
        secrets: Arc<dyn SecretStore>,
        artifacts: Arc<dyn ArtifactStore>,
        adapters: Arc<dyn AdapterFactory>,
        limits: TestRunLimitsConfig,
    ) -> Self {
        Self {
            workflows,
            runs,
            secrets,
            artifacts,
            adapters,
            limits,
        }
    }

    /// Create a queued run and launch its execution in the background
    ///
    /// Returns as soon as the run is persisted; callers poll the run
    /// repository for progress. The workflow's steps are snapshotted into the
    /// run, so later edits or deletion of the definition do not affect it.
    pub async fn create_and_launch(
        &self,
        workflow_id: WorkflowId,
        inputs: Map<String, Value>,
        mode: RunMode,
    ) -> Result<Run, DomainError> {
        let workflow = self
            .workflows
            .get(&workflow_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Workflow not found: {}", workflow_id)))?;

        if !workflow.is_active() {
            return Err(DomainError::validation(format!(
                "Workflow '{}' is inactive",
                workflow_id
            )));
        }

        let run = Run::new(workflow_id, mode, inputs, workflow.steps().to_vec());
        let run = self.runs.create(run).await?;

        info!(
            run_id = %run.id(),
            workflow_id = %run.workflow_id(),
            mode = %run.mode(),
            "Run created, launching execution"
        );

        let engine = self.clone();
        let run_id = run.id().clone();
        tokio::spawn(async move {
            if let Err(e) = engine.execute(&run_id).await {
                // Execution failures are recorded on the run itself; anything
                // surfacing here is a repository-level problem.
                error!(run_id = %run_id, error = %e, "Run execution task aborted");
            }
        });

        Ok(run)
    }

    /// Execute a queued run to a terminal status
    ///
    /// Every error raised by validation or the step loop is converted into a
    /// failed status on the run; the returned error covers only repository
    /// failures that prevent the bookkeeping itself.
    pub async fn execute(&self, run_id: &RunId) -> Result<(), DomainError> {
        let mut run = self
            .runs
            .get(run_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Run not found: {}", run_id)))?;

        if run.status() != RunStatus::Queued {
            return Err(DomainError::conflict(format!(
                "Run '{}' is {} and cannot be executed",
                run_id,
                run.status()
            )));
        }

        let started = Instant::now();

        run.mark_validating().map_err(DomainError::from)?;
        self.runs.update(&run).await?;

        debug!(run_id = %run_id, "Validating run");

        let validated =
            validation::validate_run(&run, self.secrets.as_ref(), self.adapters.as_ref()).await;

        let (report, adapters) = match validated {
            Ok(outcome) => outcome,
            Err(e) => return self.fail_run(&mut run, &e, None).await,
        };

        run.mark_running().map_err(DomainError::from)?;
        self.runs.update(&run).await?;

        if run.mode() == RunMode::ValidateOnly {
            return self.complete_validate_only(&mut run, report, started).await;
        }

        let limits = RunLimits::for_mode(run.mode(), &self.limits);
        let mut metrics = RunMetrics::default();

        match self.execute_steps(&run, &adapters, &limits, &mut metrics).await {
            Ok(output) => {
                metrics.duration_ms = started.elapsed().as_millis() as u64;

                if let Err(e) = self.write_trace(&run, &output, &metrics).await {
                    return self.fail_run(&mut run, &e.into(), Some(metrics)).await;
                }

                run.mark_completed(output, metrics)
                    .map_err(DomainError::from)?;
                self.runs.update(&run).await?;

                info!(
                    run_id = %run_id,
                    steps = metrics.steps_executed,
                    total_tokens = metrics.total_tokens,
                    duration_ms = metrics.duration_ms,
                    "Run completed"
                );
                Ok(())
            }
            Err(e) => {
                metrics.duration_ms = started.elapsed().as_millis() as u64;
                self.fail_run(&mut run, &e, Some(metrics)).await
            }
        }
    }

    /// Finish a validate-only run: the report is the output, no steps ran
    async fn complete_validate_only(
        &self,
        run: &mut Run,
        report: ValidationReport,
        started: Instant,
    ) -> Result<(), DomainError> {
        let metrics = RunMetrics {
            duration_ms: started.elapsed().as_millis() as u64,
            ..Default::default()
        };

        let output = json!({ "validation": &report });
        run.mark_completed(output, metrics).map_err(DomainError::from)?;
        self.runs.update(run).await?;

        info!(
            run_id = %run.id(),
            steps_validated = report.steps_validated,
            "Validate-only run completed"
        );
        Ok(())
    }

    /// Record a failure on the run; never partial-commits output data
    async fn fail_run(
        &self,
        run: &mut Run,
        cause: &EngineError,
        metrics: Option<RunMetrics>,
    ) -> Result<(), DomainError> {
        if cause.is_cap_violation() {
            warn!(run_id = %run.id(), "{}", cause);
        } else {
            error!(run_id = %run.id(), "Run failed: {}", cause);
        }

        run.mark_failed(cause.to_string(), metrics)
            .map_err(DomainError::from)?;
        self.runs.update(run).await?;
        Ok(())
    }

    /// Execute the run's steps strictly in declaration order
    ///
    /// Budget checks happen between steps; a provider call that is already in
    /// flight is never interrupted.
    async fn execute_steps(
        &self,
        run: &Run,
        adapters: &AdapterMap,
        limits: &RunLimits,
        metrics: &mut RunMetrics,
    ) -> Result<Value, EngineError> {
        let started = Instant::now();
        let mut context = ExecutionContext::new(run.input_data().clone());

        for (index, step) in run.steps().iter().enumerate() {
            limits.check_step_budget(metrics.steps_executed)?;
            limits.check_deadline(started)?;

            let variable = step.output_variable(index);

            let (output, usage) = match step {
                StepSpec::Prompt(prompt) => {
                    self.execute_prompt_step(run, index, prompt, &context, adapters, limits)
                        .await?
                }
                StepSpec::Transform(transform) => {
                    (execute_transform_step(index, transform, &context)?, None)
                }
                StepSpec::Validate(validate) => {
                    (execute_validate_step(index, validate, &context)?, None)
                }
            };

            if let Some(usage) = usage {
                metrics.prompt_tokens += usage.prompt_tokens;
                metrics.completion_tokens += usage.completion_tokens;
                metrics.total_tokens += usage.total_tokens();
            }
            metrics.steps_executed += 1;

            debug!(
                run_id = %run.id(),
                step = index,
                kind = step.kind_name(),
                variable = %variable,
                "Step completed"
            );

            context.bind(StepOutput {
                index,
                kind: step.kind_name().to_string(),
                variable,
                output,
                tokens: usage.map(|u| u.total_tokens()).unwrap_or(0),
            });
        }

        let final_output = context
            .last_output()
            .map(|step| step.output.clone())
            .unwrap_or(Value::Null);

        Ok(json!({
            "final": final_output,
            "steps": context.outputs(),
        }))
    }

    /// Render, call the provider, and record prompt/response artifacts
    async fn execute_prompt_step(
        &self,
        run: &Run,
        index: usize,
        step: &PromptStep,
        context: &ExecutionContext,
        adapters: &AdapterMap,
        limits: &RunLimits,
    ) -> Result<(Value, Option<Usage>), EngineError> {
        let adapter = adapters.get(&step.provider).ok_or_else(|| {
            EngineError::validation(format!("no adapter resolved for provider '{}'", step.provider))
        })?;

        let prompt = context.render(&step.template, index)?;
        let system_prompt = match step.system_prompt {
            Some(ref template) => Some(context.render(template, index)?),
            None => None,
        };

        self.artifacts
            .write(
                run.id(),
                Some(index),
                ArtifactKind::Prompt,
                &json!({
                    "step": index,
                    "provider": step.provider,
                    "prompt": prompt,
                    "system": system_prompt,
                }),
            )
            .await?;

        let model = step
            .model
            .clone()
            .unwrap_or_else(|| adapter.default_model().to_string());

        let mut builder = CompletionRequest::builder(model);
        if let Some(system_prompt) = system_prompt {
            builder = builder.system(system_prompt);
        }
        let mut request = builder
            .user(prompt)
            .temperature(step.temperature.unwrap_or(DEFAULT_TEMPERATURE))
            .build();
        request.max_tokens = step.max_tokens;

        if let Some(cap) = limits.max_tokens_per_step {
            request.clamp_max_tokens(cap);
        }

        let response = adapter.complete(request).await?;
        let usage = response.usage.unwrap_or_default();

        limits.check_step_tokens(index, usage.completion_tokens)?;

        self.artifacts
            .write(
                run.id(),
                Some(index),
                ArtifactKind::Response,
                &serde_json::to_value(&response)
                    .map_err(|e| DomainError::internal(e.to_string()))?,
            )
            .await?;

        Ok((Value::String(response.text), Some(usage)))
    }

    /// Persist the run's execution trace as a run-level artifact
    async fn write_trace(
        &self,
        run: &Run,
        output: &Value,
        metrics: &RunMetrics,
    ) -> Result<(), DomainError> {
        self.artifacts
            .write(
                run.id(),
                None,
                ArtifactKind::Trace,
                &json!({
                    "run_id": run.id(),
                    "workflow_id": run.workflow_id(),
                    "mode": run.mode(),
                    "input_data": run.input_data(),
                    "output": output,
                    "metrics": metrics,
                }),
            )
            .await?;
        Ok(())
    }
}

/// Apply a transform function to the context
fn execute_transform_step(
    index: usize,
    step: &TransformStep,
    context: &ExecutionContext,
) -> Result<Value, EngineError> {
    match step.function {
        TransformFunction::Extract => context.get(&step.source).cloned().ok_or_else(|| {
            EngineError::template(
                index,
                format!("transform source '{}' is undefined", step.source),
            )
        }),
    }
}

/// Check rules against a context variable; a failing rule is recorded in the
/// step's output, it does not abort the run
fn execute_validate_step(
    index: usize,
    step: &ValidateStep,
    context: &ExecutionContext,
) -> Result<Value, EngineError> {
    let value = context.get(&step.source).cloned().ok_or_else(|| {
        EngineError::template(
            index,
            format!("validation source '{}' is undefined", step.source),
        )
    })?;

    let text = match value {
        Value::String(ref s) => s.clone(),
        ref other => other.to_string(),
    };

    let mut errors: Vec<String> = Vec::new();

    for rule in &step.rules {
        match rule {
            ValidationRule::NotEmpty => {
                if text.trim().is_empty() {
                    errors.push("value is empty".to_string());
                }
            }
            ValidationRule::MinLength { value: min } => {
                if text.len() < *min {
                    errors.push(format!("value too short (min: {})", min));
                }
            }
        }
    }

    Ok(json!({ "valid": errors.is_empty(), "errors": errors }))
}
