//! Chat-completion client for OpenAI-compatible endpoints.
//!
//! Every registered [`Model`] carries its own base URL and key, so one
//! client serves all of them.

use async_trait::async_trait;
use evalboard_core::Model;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Messages and sampling parameters for one completion. The target model id
/// comes from the [`Model`] the request is sent to.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("invalid base URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed completion response: {0}")]
    Malformed(String),

    #[error("completion returned no content")]
    EmptyContent,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the text of the first choice.
    async fn complete(&self, model: &Model, request: &ChatRequest) -> Result<String, ProviderError>;
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("evalboard/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: Client,
}

impl OpenAiCompatClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// `{base}/chat/completions`, keeping any path prefix on the base URL.
    pub fn endpoint(base_url: &str) -> Result<Url, ProviderError> {
        let invalid = |reason: String| ProviderError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };
        let mut base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("chat/completions").map_err(|e| invalid(e.to_string()))
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatClient {
    async fn complete(&self, model: &Model, request: &ChatRequest) -> Result<String, ProviderError> {
        let url = Self::endpoint(&model.base_url)?;
        let body = CompletionBody {
            model: &model.provider_model_id,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %model.name, %url, "Sending chat completion");

        let response = self
            .client
            .post(url)
            .bearer_auth(&model.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status { status, body: text });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://api.example.com/v1", "https://api.example.com/v1/chat/completions")]
    #[case("https://api.example.com/v1/", "https://api.example.com/v1/chat/completions")]
    #[case("http://localhost:8000", "http://localhost:8000/chat/completions")]
    fn endpoint_appends_chat_completions(#[case] base: &str, #[case] expected: &str) {
        assert_eq!(OpenAiCompatClient::endpoint(base).unwrap().as_str(), expected);
    }

    #[test]
    fn endpoint_rejects_garbage() {
        assert!(matches!(
            OpenAiCompatClient::endpoint("not a url"),
            Err(ProviderError::InvalidUrl { .. })
        ));
    }
}
