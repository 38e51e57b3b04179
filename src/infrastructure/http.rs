//! HTTP client seam for provider adapters
//!
//! Adapters talk to this trait instead of reqwest directly so their request
//! building and response parsing can be tested against scripted responses.
//! Errors keep the HTTP status so the adapter can classify them into the
//! typed provider error taxonomy.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Transport-level failures, prior to provider classification
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HttpError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Network(String),

    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl HttpError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

/// Minimal JSON-over-HTTP client used by all provider adapters
#[async_trait]
pub trait HttpClientTrait: Send + Sync + Debug {
    async fn get_json(&self, url: &str, headers: Vec<(&str, &str)>) -> Result<Value, HttpError>;

    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &Value,
    ) -> Result<Value, HttpError>;
}

/// Real HTTP client backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(60))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    async fn handle_response(response: reqwest::Response) -> Result<Value, HttpError> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| HttpError::Decode(e.to_string()))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn get_json(&self, url: &str, headers: Vec<(&str, &str)>) -> Result<Value, HttpError> {
        let mut request = self.client.get(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;

        Self::handle_response(response).await
    }

    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &Value,
    ) -> Result<Value, HttpError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;

        Self::handle_response(response).await
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    /// Scripted HTTP client: per-URL queues of canned results
    ///
    /// Each call pops the next scripted result for the URL; the last entry is
    /// repeated once the queue is drained.
    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        scripts: Mutex<HashMap<String, VecDeque<Result<Value, HttpError>>>>,
        requests: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: impl Into<String>, response: Value) -> Self {
            self.push(url.into(), Ok(response));
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: HttpError) -> Self {
            self.push(url.into(), Err(error));
            self
        }

        pub fn request_count(&self, url: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.as_str() == url)
                .count()
        }

        fn push(&self, url: String, result: Result<Value, HttpError>) {
            self.scripts
                .lock()
                .unwrap()
                .entry(url)
                .or_default()
                .push_back(result);
        }

        fn next(&self, url: &str) -> Result<Value, HttpError> {
            self.requests.lock().unwrap().push(url.to_string());

            let mut scripts = self.scripts.lock().unwrap();
            let Some(queue) = scripts.get_mut(url) else {
                return Err(HttpError::Network(format!("no mock response for {}", url)));
            };

            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap_or_else(|| {
                    Err(HttpError::Network(format!("no mock response for {}", url)))
                })
            }
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn get_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
        ) -> Result<Value, HttpError> {
            self.next(url)
        }

        async fn post_json(
            &self,
            url: &str,
            _headers: Vec<(&str, &str)>,
            _body: &Value,
        ) -> Result<Value, HttpError> {
            self.next(url)
        }
    }
}
