//! Google Gemini generateContent adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{classify_http_error, with_retries};
use crate::domain::{
    CompletionRequest, CompletionResponse, FinishReason, MessageRole, ProviderAdapter,
    ProviderError, ProviderKind, Usage,
};
use crate::infrastructure::http::HttpClientTrait;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Google Gemini API adapter
#[derive(Debug)]
pub struct GeminiAdapter<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
}

impl<C: HttpClientTrait> GeminiAdapter<C> {
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

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn models_url(&self) -> String {
        format!("{}/v1beta/models", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, request: &CompletionRequest) -> Value {
        let mut system_parts: Vec<Value> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for message in &request.messages {
            match message.role {
                MessageRole::System => system_parts.push(json!({ "text": message.content })),
                MessageRole::User => {
                    contents.push(json!({ "role": "user", "parts": [{ "text": message.content }] }))
                }
                MessageRole::Assistant => contents
                    .push(json!({ "role": "model", "parts": [{ "text": message.content }] })),
            }
        }

        let mut body = json!({ "contents": contents });

        if !system_parts.is_empty() {
            body["systemInstruction"] = json!({ "parts": system_parts });
        }

        let mut generation_config = json!({});
        if let Some(temperature) = request.temperature {
            generation_config["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }
        if generation_config.as_object().is_some_and(|c| !c.is_empty()) {
            body["generationConfig"] = generation_config;
        }

        if let Some(ref tools) = request.tools {
            let declarations: Vec<Value> = tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    })
                })
                .collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        body
    }

    fn parse_response(&self, model: &str, body: Value) -> Result<CompletionResponse, ProviderError> {
        let response: WireResponse = serde_json::from_value(body)
            .map_err(|e| ProviderError::invalid_response(ProviderKind::Gemini, e.to_string()))?;

        let candidate = response.candidates.into_iter().next().ok_or_else(|| {
            ProviderError::invalid_response(ProviderKind::Gemini, "no candidates in response")
        })?;

        let text = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect::<Vec<_>>()
            .join("");

        let mut completion = CompletionResponse::new(text, model);

        if let Some(ref reason) = candidate.finish_reason {
            completion = completion.with_finish_reason(parse_finish_reason(reason));
        }

        if let Some(usage) = response.usage_metadata {
            completion = completion.with_usage(Usage::new(
                usage.prompt_token_count,
                usage.candidates_token_count,
            ));
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
            .post_json(&self.generate_url(&request.model), self.headers(), &body)
            .await
            .map_err(|e| classify_http_error(ProviderKind::Gemini, e))?;

        self.parse_response(&request.model, response)
    }
}

#[async_trait]
impl<C: HttpClientTrait> ProviderAdapter for GeminiAdapter<C> {
    async fn health_check(&self) -> Result<bool, ProviderError> {
        // Listing models is free and exercises authentication
        self.client
            .get_json(&self.models_url(), self.headers())
            .await
            .map_err(|e| classify_http_error(ProviderKind::Gemini, e))?;

        Ok(true)
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        with_retries(|| self.send_completion(&request)).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

// Wire types

#[derive(Debug, Deserialize)]
struct WireResponse {
    candidates: Vec<WireCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: WireContent,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
struct WirePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: u32,
}
