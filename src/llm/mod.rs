//! Judge model invocation boundary.
//!
//! The scoring service talks to the judge through the [`LlmProvider`] trait,
//! which supports unary generation and fragment-stream delivery. The default
//! stream implementation wraps the unary call in a single-fragment stream, so
//! providers only implement streaming when the backend actually streams.
//!
//! [`JudgeClient`] is the production implementation: an OpenAI-compatible
//! `/chat/completions` gateway over HTTP.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Request timeout for judge calls. Judge models reason over long rubrics,
/// so this is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A generation request forwarded to the judge gateway.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.0,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Ordered fragments of a response; concatenating all `Ok` items yields the
/// full completion text.
pub type FragmentStream = BoxStream<'static, Result<String, LlmError>>;

/// Abstraction over the judge model backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generates a complete response.
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError>;

    /// Generates a response as a fragment stream. The default delivers the
    /// unary result as a single fragment.
    async fn generate_stream(&self, request: GenerationRequest) -> Result<FragmentStream, LlmError> {
        let response = self.generate(request).await?;
        Ok(tokio_stream::once(Ok(response)).boxed())
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// HTTP client for an OpenAI-compatible chat-completions gateway.
pub struct JudgeClient {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl JudgeClient {
    /// Creates a client against the given base URL (scheme + host, no
    /// trailing `/chat/completions`).
    pub fn new(api_base: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_base: api_base.into(),
            api_key,
        }
    }

    /// Creates a client from `JUDGE_API_BASE` / `JUDGE_API_KEY`.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_base = env::var("JUDGE_API_BASE").map_err(|_| LlmError::MissingApiBase)?;
        let api_key = env::var("JUDGE_API_KEY").ok();
        Ok(Self::new(api_base, api_key))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmProvider for JudgeClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let body = ApiRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        tracing::debug!(model = %request.model, "Invoking judge model");

        let mut http_request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| LlmError::ResponseRead(e.to_string()))?;
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .map(|e| e.message)
                .unwrap_or(text);

            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited(message));
            }
            return Err(LlmError::ApiError {
                code: status.as_u16(),
                message,
            });
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseRead(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
