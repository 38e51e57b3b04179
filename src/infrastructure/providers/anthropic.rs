//! Anthropic messages API adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{classify_http_error, with_retries};
use crate::domain::{
    CompletionRequest, CompletionResponse, FinishReason, Message, MessageRole, ProviderAdapter,
    ProviderError, ProviderKind, Usage,
};
use crate::infrastructure::http::HttpClientTrait;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Anthropic API adapter
#[derive(Debug)]
pub struct AnthropicAdapter<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> AnthropicAdapter<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &CompletionRequest) -> Value {
        let (system, messages) = split_system_messages(&request.messages);

        let wire_messages: Vec<Value> = messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    MessageRole::Assistant => "assistant",
                    _ => "user",
                };
                json!({ "role": role, "content": m.content })
            })
            .collect();

        // max_tokens is mandatory on this API
        let mut body = json!({
            "model": request.model,
            "messages": wire_messages,
            "max_tokens": request.max_tokens.unwrap_or(4096),
        });

        if let Some(system) = system {
            body["system"] = json!(system);
        }

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(ref tools) = request.tools {
            let tools: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "input_schema": tool.parameters,
                    })
                })
                .collect();
            body["tools"] = json!(tools);
        }

        body
    }

    fn parse_response(&self, body: Value) -> Result<CompletionResponse, ProviderError> {
        let response: WireResponse = serde_json::from_value(body)
            .map_err(|e| ProviderError::invalid_response(ProviderKind::Anthropic, e.to_string()))?;

        let text = response
            .content
            .into_iter()
            .filter_map(|block| {
                if block.content_type == "text" {
                    block.text
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        let mut completion = CompletionResponse::new(text, response.model)
            .with_usage(Usage::new(
                response.usage.input_tokens,
                response.usage.output_tokens,
            ));

        if let Some(ref reason) = response.stop_reason {
            completion = completion.with_finish_reason(parse_stop_reason(reason));
        }

        Ok(completion)
    }

    async fn send_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let body = self.build_request(request);
        let response = self
            .client
            .post_json(&self.messages_url(), self.headers(), &body)
            .await
            .map_err(|e| classify_http_error(ProviderKind::Anthropic, e))?;

        self.parse_response(response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> ProviderAdapter for AnthropicAdapter<C> {
    async fn health_check(&self) -> Result<bool, ProviderError> {
        // No free list endpoint on this API; a one-token message is the
        // cheapest probe that still exercises authentication
        let probe = CompletionRequest::builder(DEFAULT_MODEL)
            .user("ping")
            .max_tokens(1)
            .build();

        self.send_completion(&probe).await?;
        Ok(true)
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        with_retries(|| self.send_completion(&request)).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }
}

/// Fold system messages into the dedicated `system` field
fn split_system_messages(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let mut system = String::new();
    let mut rest = Vec::new();

    for message in messages {
        if message.role == MessageRole::System {
            if !system.is_empty() {
                system.push('\n');
            }
            system.push_str(&message.content);
        } else {
            rest.push(message);
        }
    }

    let system = if system.is_empty() {
        None
    } else {
        Some(system)
    };

    (system, rest)
}

fn parse_stop_reason(reason: &str) -> FinishReason {
    match reason {
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    }
}

// Wire types

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: String,
    content: Vec<WireContentBlock>,
    stop_reason: Option<String>,
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct WireContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::mock::MockHttpClient;

    const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

    fn messages_response(text: &str) -> Value {
        json!({
            "id": "msg_01",
            "model": "claude-3-5-sonnet-20241022",
            "content": [{ "type": "text", "text": text }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 14, "output_tokens": 7 }
        })
    }

    #[tokio::test]
    async fn test_complete() {
        let client = MockHttpClient::new().with_response(MESSAGES_URL, messages_response("Hi."));
        let adapter = AnthropicAdapter::new(client, "sk-ant-test");

        let request = CompletionRequest::builder("claude-3-5-sonnet-20241022")
            .system("Be terse.")
            .user("Say hi")
            .build();

        let response = adapter.complete(request).await.unwrap();
        assert_eq!(response.text, "Hi.");
        assert_eq!(response.usage.unwrap().prompt_tokens, 14);
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    }

    #[test]
    fn test_system_messages_folded_into_system_field() {
        let client = MockHttpClient::new();
        let adapter = AnthropicAdapter::new(client, "sk-ant-test");

        let request = CompletionRequest::builder("claude-3-5-sonnet-20241022")
            .system("You are a researcher.")
            .user("Question")
            .build();

        let body = adapter.build_request(&request);
        assert_eq!(body["system"], "You are a researcher.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 4096);
    }

    #[tokio::test]
    async fn test_health_check_uses_minimal_probe() {
        let client = MockHttpClient::new().with_response(MESSAGES_URL, messages_response("pong"));
        let adapter = AnthropicAdapter::new(client, "sk-ant-test");

        assert!(adapter.health_check().await.unwrap());
        assert_eq!(adapter.client.request_count(MESSAGES_URL), 1);
    }

    #[test]
    fn test_parse_max_tokens_stop_reason() {
        assert_eq!(parse_stop_reason("max_tokens"), FinishReason::Length);
        assert_eq!(parse_stop_reason("end_turn"), FinishReason::Stop);
    }
}
