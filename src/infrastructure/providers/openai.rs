//! OpenAI chat-completions adapter
//!
//! Also fronts DeepSeek, Groq and OpenRouter, which expose the same wire
//! protocol behind different base URLs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{classify_http_error, with_retries};
use crate::domain::{
    CompletionRequest, CompletionResponse, FinishReason, Message, MessageRole, ProviderAdapter,
    ProviderError, ProviderKind, Usage,
};
use crate::infrastructure::http::HttpClientTrait;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";

/// Adapter for the OpenAI chat-completions protocol
#[derive(Debug)]
pub struct OpenAiAdapter<C: HttpClientTrait> {
    client: C,
    kind: ProviderKind,
    auth_header: String,
    base_url: String,
    default_model: String,
}

impl<C: HttpClientTrait> OpenAiAdapter<C> {
    pub fn openai(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(
            client,
            ProviderKind::OpenAi,
            api_key,
            OPENAI_BASE_URL,
            "gpt-4o-mini",
        )
    }

    pub fn deepseek(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(
            client,
            ProviderKind::DeepSeek,
            api_key,
            DEEPSEEK_BASE_URL,
            "deepseek-chat",
        )
    }

    pub fn groq(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(
            client,
            ProviderKind::Groq,
            api_key,
            GROQ_BASE_URL,
            "llama-3.3-70b-versatile",
        )
    }

    pub fn openrouter(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(
            client,
            ProviderKind::OpenRouter,
            api_key,
            OPENROUTER_BASE_URL,
            "openrouter/auto",
        )
    }

    pub fn with_base_url(
        client: C,
        kind: ProviderKind,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            kind,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &CompletionRequest) -> Value {
        let messages: Vec<WireMessage> = request.messages.iter().map(WireMessage::from).collect();

        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(ref tools) = request.tools {
            let tools: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = json!(tools);
        }

        body
    }

    fn parse_response(&self, body: Value) -> Result<CompletionResponse, ProviderError> {
        let response: WireResponse = serde_json::from_value(body)
            .map_err(|e| ProviderError::invalid_response(self.kind, e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::invalid_response(self.kind, "no choices in response"))?;

        let mut completion = CompletionResponse::new(
            choice.message.content.unwrap_or_default(),
            response.model,
        );

        if let Some(reason) = choice.finish_reason {
            completion = completion.with_finish_reason(parse_finish_reason(&reason));
        }

        if let Some(usage) = response.usage {
            completion =
                completion.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
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
            .post_json(&self.chat_completions_url(), self.headers(), &body)
            .await
            .map_err(|e| classify_http_error(self.kind, e))?;

        self.parse_response(response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> ProviderAdapter for OpenAiAdapter<C> {
    async fn health_check(&self) -> Result<bool, ProviderError> {
        // Listing models is free and exercises authentication
        self.client
            .get_json(&self.models_url(), self.headers())
            .await
            .map_err(|e| classify_http_error(self.kind, e))?;

        Ok(true)
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        with_retries(|| self.send_completion(&request)).await
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        "tool_calls" | "function_call" => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        Self {
            role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
