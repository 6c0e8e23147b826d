use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::clients::traits::{BackendError, GenerativeBackend};
use crate::config::GeminiConfig;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const ERROR_BODY_CAP_CHARS: usize = 2 * 1024;

/// REST client for the `generateContent` endpoint.
///
/// The credential travels as the `key` query parameter; reqwest errors are
/// stripped of their URL before they are surfaced so it never reaches logs.
pub struct GeminiRestClient {
    http: Client,
    base_url: String,
    model: String,
}

impl GeminiRestClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &GeminiConfig) -> Result<Self, BackendError> {
        Self::new(
            config.base_url.clone(),
            config.model.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl GenerativeBackend for GeminiRestClient {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String, BackendError> {
        tracing::debug!(model = %self.model, "sending generateContent request");

        let resp = self
            .http
            .post(self.endpoint())
            .query(&[("key", credential)])
            .json(&request_body(prompt))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_CAP_CHARS).collect(),
            });
        }

        let val: Value = resp
            .json()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.without_url().to_string()))?;
        extract_text(&val)
    }
}

pub fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    })
}

/// Pull `candidates[0].content.parts[0].text` out of a reply.
pub fn extract_text(val: &Value) -> Result<String, BackendError> {
    val.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            let preview: String = val.to_string().chars().take(200).collect();
            BackendError::MalformedResponse(format!(
                "missing candidates[0].content.parts[0].text in {}",
                preview
            ))
        })
}
