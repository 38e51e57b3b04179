//! Preflight validation
//!
//! Runs in every mode before any step executes: checks the step snapshot
//! statically (variable references must point at inputs or earlier steps) and
//! probes each referenced provider once (secret configured, health check
//! passing). No generation endpoint is ever touched here.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::context::referenced_variables;
use super::error::EngineError;
use crate::domain::{
    AdapterFactory, ProviderAdapter, ProviderKind, Run, SecretStore, StepSpec,
};

/// Outcome of a successful preflight pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub steps_validated: usize,
    pub providers_checked: Vec<ProviderKind>,
}

/// Adapters built during validation, reused by the step loop
pub type AdapterMap = HashMap<ProviderKind, Arc<dyn ProviderAdapter>>;

/// Validate a run's step snapshot and provider configuration
///
/// Collects every problem instead of stopping at the first, so a single
/// validate-only pass surfaces all of them.
pub async fn validate_run(
    run: &Run,
    secrets: &dyn SecretStore,
    factory: &dyn AdapterFactory,
) -> Result<(ValidationReport, AdapterMap), EngineError> {
    let mut errors: Vec<String> = Vec::new();

    if run.steps().is_empty() {
        errors.push(format!(
            "workflow '{}' has no steps",
            run.workflow_id()
        ));
    }

    check_variable_references(run, &mut errors);

    let adapters = check_providers(run, secrets, factory, &mut errors).await;

    if !errors.is_empty() {
        return Err(EngineError::validation(errors.join("; ")));
    }

    let mut providers_checked: Vec<ProviderKind> = adapters.keys().copied().collect();
    providers_checked.sort_by_key(|kind| kind.as_str());

    debug!(
        run_id = %run.id(),
        steps = run.steps().len(),
        providers = providers_checked.len(),
        "Preflight validation passed"
    );

    Ok((
        ValidationReport {
            steps_validated: run.steps().len(),
            providers_checked,
        },
        adapters,
    ))
}

/// Statically check that every referenced variable is defined by the inputs
/// or by an earlier step's output variable
fn check_variable_references(run: &Run, errors: &mut Vec<String>) {
    let mut defined: Vec<String> = run.input_data().keys().cloned().collect();

    for (index, step) in run.steps().iter().enumerate() {
        match step {
            StepSpec::Prompt(prompt) => {
                check_template(&prompt.template, index, &defined, errors);
                if let Some(ref system_prompt) = prompt.system_prompt {
                    check_template(system_prompt, index, &defined, errors);
                }
            }
            StepSpec::Transform(transform) => {
                if !defined.iter().any(|v| v == &transform.source) {
                    errors.push(format!(
                        "step {}: transform source '{}' is not defined by inputs or an earlier step",
                        index, transform.source
                    ));
                }
            }
            StepSpec::Validate(validate) => {
                if !defined.iter().any(|v| v == &validate.source) {
                    errors.push(format!(
                        "step {}: validation source '{}' is not defined by inputs or an earlier step",
                        index, validate.source
                    ));
                }
            }
        }

        defined.push(step.output_variable(index));
    }
}

fn check_template(template: &str, index: usize, defined: &[String], errors: &mut Vec<String>) {
    for variable in referenced_variables(template) {
        if !defined.iter().any(|v| v == &variable) {
            errors.push(format!(
                "step {}: template references '{{{{{}}}}}' which no input or earlier step provides",
                index, variable
            ));
        }
    }
}

/// Resolve a secret and build an adapter for each distinct provider, probing
/// its health once
async fn check_providers(
    run: &Run,
    secrets: &dyn SecretStore,
    factory: &dyn AdapterFactory,
    errors: &mut Vec<String>,
) -> AdapterMap {
    let mut adapters: AdapterMap = HashMap::new();

    for step in run.steps() {
        let Some(kind) = step.provider() else {
            continue;
        };

        if adapters.contains_key(&kind) {
            continue;
        }

        let secret = match secrets.get_secret(kind).await {
            Ok(Some(secret)) => secret,
            Ok(None) => {
                errors.push(format!(
                    "missing credential: no API key configured for provider '{}'",
                    kind
                ));
                continue;
            }
            Err(e) => {
                errors.push(format!(
                    "failed to read credential for provider '{}': {}",
                    kind, e
                ));
                continue;
            }
        };

        let adapter = match factory.create(kind, &secret) {
            Ok(adapter) => adapter,
            Err(e) => {
                errors.push(format!("cannot build adapter for provider '{}': {}", kind, e));
                continue;
            }
        };

        match adapter.health_check().await {
            Ok(true) => {
                adapters.insert(kind, adapter);
            }
            Ok(false) => {
                errors.push(format!("provider '{}' failed its health check", kind));
            }
            Err(e) => {
                errors.push(format!("provider '{}' is unreachable: {}", kind, e));
            }
        }
    }

    adapters
}
