use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Message;

/// Declaration of a tool the model may call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool parameters
    pub parameters: Value,
}

/// Normalized completion request, independent of the concrete provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            temperature: None,
            tools: None,
        }
    }

    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder {
            request: Self::new(model, Vec::new()),
        }
    }

    /// Clamp the requested token budget to an upper bound, setting it if absent
    pub fn clamp_max_tokens(&mut self, limit: u32) {
        self.max_tokens = Some(match self.max_tokens {
            Some(requested) => requested.min(limit),
            None => limit,
        });
    }
}

/// Builder for [`CompletionRequest`]
#[derive(Debug)]
pub struct CompletionRequestBuilder {
    request: CompletionRequest,
}

impl CompletionRequestBuilder {
    pub fn message(mut self, message: Message) -> Self {
        self.request.messages.push(message);
        self
    }

    pub fn system(self, content: impl Into<String>) -> Self {
        self.message(Message::system(content))
    }

    pub fn user(self, content: impl Into<String>) -> Self {
        self.message(Message::user(content))
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.request.max_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.request.temperature = Some(temperature);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.request.tools = Some(tools);
        self
    }

    pub fn build(self) -> CompletionRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = CompletionRequest::builder("gpt-4o-mini")
            .system("You are terse.")
            .user("Hello")
            .max_tokens(256)
            .temperature(0.7)
            .build();

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.max_tokens, Some(256));
        assert!(request.tools.is_none());
    }

    #[test]
    fn test_clamp_max_tokens() {
        let mut request = CompletionRequest::builder("gpt-4o").max_tokens(4096).build();
        request.clamp_max_tokens(1000);
        assert_eq!(request.max_tokens, Some(1000));

        let mut request = CompletionRequest::builder("gpt-4o").max_tokens(500).build();
        request.clamp_max_tokens(1000);
        assert_eq!(request.max_tokens, Some(500));

        let mut request = CompletionRequest::builder("gpt-4o").build();
        request.clamp_max_tokens(1000);
        assert_eq!(request.max_tokens, Some(1000));
    }
}
