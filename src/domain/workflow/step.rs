//! Step specifications
//!
//! A step is a value object inside a workflow definition, identified by its
//! position. Prompt steps call an LLM provider; transform and validate steps
//! operate on variables already in the execution context.

use serde::{Deserialize, Serialize};

use crate::domain::provider::ProviderKind;

/// One step of a workflow definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepSpec {
    /// Templated prompt sent to an LLM provider
    Prompt(PromptStep),

    /// Local data manipulation between prompt steps
    Transform(TransformStep),

    /// Rule checks against a context variable
    Validate(ValidateStep),
}

impl StepSpec {
    /// Variable this step binds its output to, given its position
    pub fn output_variable(&self, index: usize) -> String {
        let configured = match self {
            Self::Prompt(step) => step.output_variable.as_deref(),
            Self::Transform(step) => step.output_variable.as_deref(),
            Self::Validate(step) => step.output_variable.as_deref(),
        };

        configured
            .map(str::to_string)
            .unwrap_or_else(|| format!("step_{}_output", index))
    }

    /// Provider referenced by this step, if it makes provider calls
    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            Self::Prompt(step) => Some(step.provider),
            Self::Transform(_) | Self::Validate(_) => None,
        }
    }

    /// Short name of the step kind, for logs and error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Prompt(_) => "prompt",
            Self::Transform(_) => "transform",
            Self::Validate(_) => "validate",
        }
    }
}

/// A prompt step: template + provider reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptStep {
    /// Prompt template with `{{variable}}` placeholders
    pub template: String,

    /// Provider that serves this step
    pub provider: ProviderKind,

    /// Model override; the adapter's default model when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Optional system prompt (also templated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Context variable the response text is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_variable: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl PromptStep {
    pub fn new(template: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            template: template.into(),
            provider,
            model: None,
            system_prompt: None,
            output_variable: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_output_variable(mut self, variable: impl Into<String>) -> Self {
        self.output_variable = Some(variable.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Supported transform functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformFunction {
    /// Copy a variable's value to a new name
    Extract,
}

/// A transform step: local variable manipulation, no provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStep {
    pub function: TransformFunction,

    /// Context variable the transform reads from
    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_variable: Option<String>,
}

impl TransformStep {
    pub fn extract(source: impl Into<String>) -> Self {
        Self {
            function: TransformFunction::Extract,
            source: source.into(),
            output_variable: None,
        }
    }

    pub fn with_output_variable(mut self, variable: impl Into<String>) -> Self {
        self.output_variable = Some(variable.into());
        self
    }
}

/// A single validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationRule {
    /// Value must be present and not blank
    NotEmpty,

    /// Value must be at least `value` characters long
    MinLength { value: usize },
}

/// A validate step: rule checks against a context variable, no provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateStep {
    /// Context variable the rules are applied to
    pub source: String,

    pub rules: Vec<ValidationRule>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_variable: Option<String>,
}

impl ValidateStep {
    pub fn new(source: impl Into<String>, rules: Vec<ValidationRule>) -> Self {
        Self {
            source: source.into(),
            rules,
            output_variable: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_serialization_tags() {
        let step = StepSpec::Prompt(PromptStep::new("Summarize {{topic}}", ProviderKind::OpenAi));
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"type\":\"prompt\""));
        assert!(json.contains("\"provider\":\"openai\""));

        let step = StepSpec::Transform(TransformStep::extract("summary"));
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"type\":\"transform\""));
        assert!(json.contains("\"function\":\"extract\""));

        let step = StepSpec::Validate(ValidateStep::new(
            "summary",
            vec![ValidationRule::NotEmpty, ValidationRule::MinLength { value: 10 }],
        ));
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"type\":\"validate\""));
        assert!(json.contains("\"min_length\""));
    }

    #[test]
    fn test_output_variable_default() {
        let step = StepSpec::Prompt(PromptStep::new("Hello", ProviderKind::Gemini));
        assert_eq!(step.output_variable(2), "step_2_output");

        let step = StepSpec::Prompt(
            PromptStep::new("Hello", ProviderKind::Gemini).with_output_variable("greeting"),
        );
        assert_eq!(step.output_variable(2), "greeting");
    }

    #[test]
    fn test_provider_reference() {
        let prompt = StepSpec::Prompt(PromptStep::new("Hi", ProviderKind::Anthropic));
        assert_eq!(prompt.provider(), Some(ProviderKind::Anthropic));

        let transform = StepSpec::Transform(TransformStep::extract("x"));
        assert_eq!(transform.provider(), None);
    }

    #[test]
    fn test_step_deserialization() {
        let json = r#"{
            "type": "prompt",
            "template": "Explain {{concept}}",
            "provider": "deepseek",
            "output_variable": "explanation"
        }"#;

        let step: StepSpec = serde_json::from_str(json).unwrap();
        match step {
            StepSpec::Prompt(prompt) => {
                assert_eq!(prompt.provider, ProviderKind::DeepSeek);
                assert_eq!(prompt.output_variable.as_deref(), Some("explanation"));
            }
            other => panic!("expected prompt step, got {:?}", other),
        }
    }
}
