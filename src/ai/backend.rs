//! Inference capability boundary
//!
//! The pipeline only ever talks to `dyn InferenceBackend`. The production
//! adapter is `OllamaBackend`; tests inject `StubBackend`.

use crate::error::InferenceError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Text, vision and speech-to-text capabilities consumed as black boxes
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Complete a text prompt
    async fn generate_text(&self, prompt: &str) -> Result<String, InferenceError>;

    /// Complete a prompt about a single image (JPEG/PNG bytes)
    async fn generate_from_image(&self, image: &[u8], prompt: &str)
        -> Result<String, InferenceError>;

    /// Transcribe an audio file; `file_name` carries the container format
    async fn transcribe_audio(&self, audio: &[u8], file_name: &str)
        -> Result<String, InferenceError>;
}

/// Run one inference call under a deadline, rejecting blank replies
pub async fn bounded<F>(limit: Duration, call: F) -> Result<String, InferenceError>
where
    F: Future<Output = Result<String, InferenceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Err(InferenceError::EmptyResponse)
            } else {
                Ok(text.to_string())
            }
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(InferenceError::Timeout(limit.as_secs())),
    }
}
