use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Outbound generative-content call. Implementations return the model's raw
/// reply text; interpreting it is left to the caller.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String, BackendError>;
}
