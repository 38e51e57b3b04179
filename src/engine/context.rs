//! Execution context and template rendering
//!
//! Templates reference context variables as `{{variable}}`. The context is
//! seeded with the run's inputs; each executed step binds its output variable
//! on top. The context is private to one execution task - runs never share
//! mutable state.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::EngineError;

/// Regex for `{{variable}}` placeholders
static TEMPLATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").unwrap());

/// Variables referenced by a template, in order of appearance
pub fn referenced_variables(template: &str) -> Vec<String> {
    TEMPLATE_PATTERN
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Output of one executed step, kept for the final output and the trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutput {
    pub index: usize,
    pub kind: String,
    pub variable: String,
    pub output: Value,
    pub tokens: u32,
}

/// Per-run execution context: inputs plus accumulated step outputs
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    input_data: Map<String, Value>,
    variables: HashMap<String, Value>,
    outputs: Vec<StepOutput>,
}

impl ExecutionContext {
    pub fn new(input_data: Map<String, Value>) -> Self {
        Self {
            input_data,
            variables: HashMap::new(),
            outputs: Vec::new(),
        }
    }

    /// Look up a variable: step outputs shadow inputs
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables
            .get(name)
            .or_else(|| self.input_data.get(name))
    }

    /// Bind a step's output under its variable name
    pub fn bind(&mut self, output: StepOutput) {
        self.variables
            .insert(output.variable.clone(), output.output.clone());
        self.outputs.push(output);
    }

    pub fn outputs(&self) -> &[StepOutput] {
        &self.outputs
    }

    pub fn last_output(&self) -> Option<&StepOutput> {
        self.outputs.last()
    }

    /// Render a template, substituting every `{{variable}}` placeholder
    ///
    /// Unresolved placeholders are caught by preflight validation; hitting one
    /// here still fails the step rather than sending a broken prompt.
    pub fn render(&self, template: &str, step_index: usize) -> Result<String, EngineError> {
        let mut rendered = template.to_string();

        for caps in TEMPLATE_PATTERN.captures_iter(template) {
            let placeholder = caps.get(0).unwrap().as_str();
            let name = &caps[1];

            let value = self.get(name).ok_or_else(|| {
                EngineError::template(
                    step_index,
                    format!("template references undefined variable '{}'", name),
                )
            })?;

            rendered = rendered.replace(placeholder, &value_to_string(value));
        }

        Ok(rendered)
    }
}

/// Render a JSON value for prompt interpolation: strings bare, the rest as JSON
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context_with_input(input: Value) -> ExecutionContext {
        let map = input.as_object().cloned().unwrap_or_default();
        ExecutionContext::new(map)
    }

    #[test]
    fn test_referenced_variables() {
        let vars = referenced_variables("Summarize {{topic}} for a {{ audience }}");
        assert_eq!(vars, vec!["topic", "audience"]);

        assert!(referenced_variables("no placeholders here").is_empty());
    }

    #[test]
    fn test_render_from_inputs() {
        let context = context_with_input(json!({"topic": "llm evaluation"}));
        let rendered = context.render("Summarize {{topic}}", 0).unwrap();
        assert_eq!(rendered, "Summarize llm evaluation");
    }

    #[test]
    fn test_render_from_step_output() {
        let mut context = context_with_input(json!({}));
        context.bind(StepOutput {
            index: 0,
            kind: "prompt".to_string(),
            variable: "summary".to_string(),
            output: json!("a short summary"),
            tokens: 12,
        });

        let rendered = context.render("Refine: {{summary}}", 1).unwrap();
        assert_eq!(rendered, "Refine: a short summary");
    }

    #[test]
    fn test_step_output_shadows_input() {
        let mut context = context_with_input(json!({"topic": "original"}));
        context.bind(StepOutput {
            index: 0,
            kind: "prompt".to_string(),
            variable: "topic".to_string(),
            output: json!("rewritten"),
            tokens: 0,
        });

        let rendered = context.render("{{topic}}", 1).unwrap();
        assert_eq!(rendered, "rewritten");
    }

    #[test]
    fn test_render_undefined_variable() {
        let context = context_with_input(json!({}));
        let result = context.render("Use {{undefined_var}}", 3);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("undefined_var"));
        assert!(err.to_string().starts_with("Step 3"));
    }

    #[test]
    fn test_render_non_string_value() {
        let context = context_with_input(json!({"count": 3}));
        let rendered = context.render("There are {{count}} items", 0).unwrap();
        assert_eq!(rendered, "There are 3 items");
    }
}
