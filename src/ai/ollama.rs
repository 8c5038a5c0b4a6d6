//! Ollama Backend
//!
//! Local inference over HTTP:
//! - Text and vision completions via Ollama's `/api/generate` (non-streaming)
//! - Speech-to-text via an OpenAI-compatible `/v1/audio/transcriptions` server
//! - Retry with exponential backoff on 429/5xx and transport errors

use super::backend::InferenceBackend;
use crate::config::OrganizerConfig;
use crate::error::InferenceError;
use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// First backoff delay; doubles per retry
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Inference backend talking to a local Ollama server
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    text_model: String,
    vision_model: String,
    transcription_url: String,
    transcription_model: String,
    max_retries: u32,
}

impl OllamaBackend {
    pub fn new(config: &OrganizerConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(config.max_workers)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| InferenceError::Request(format!("failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "[Ollama] Using {} (text: {}, vision: {})",
            config.ollama_url,
            config.text_model,
            config.vision_model
        );

        Ok(Self {
            client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            vision_model: config.vision_model.clone(),
            transcription_url: config.transcription_url.clone(),
            transcription_model: config.transcription_model.clone(),
            max_retries: config.max_retries,
        })
    }

    async fn generate(&self, model: &str, prompt: &str, images: Vec<String>) -> Result<String, InferenceError> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            images,
            options: GenerateOptions { temperature: 0.2 },
        };
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .send_with_retry(|| Ok(self.client.post(&url).json(&request)))
            .await?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Request(format!("failed to parse response: {}", e)))?;

        Ok(body.response)
    }

    /// Send a request, rebuilding it for each attempt
    async fn send_with_retry<F>(&self, build: F) -> Result<Response, InferenceError>
    where
        F: Fn() -> Result<RequestBuilder, InferenceError>,
    {
        let mut retry_delay = INITIAL_RETRY_DELAY;
        let mut last_error = InferenceError::Request("no attempt made".to_string());

        for retry in 0..=self.max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            match build()?.send().await {
                Ok(r) if r.status().is_success() => return Ok(r),
                Ok(r) if is_retryable(r.status()) => {
                    let status = r.status();
                    tracing::warn!(
                        "[Ollama] Backend returned {}, retry {}/{}",
                        status,
                        retry + 1,
                        self.max_retries
                    );
                    last_error = InferenceError::Api {
                        status: status.as_u16(),
                        body: r.text().await.unwrap_or_default(),
                    };
                }
                Ok(r) => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    return Err(InferenceError::Api { status, body });
                }
                Err(e) => {
                    tracing::warn!(
                        "[Ollama] Request failed ({}), retry {}/{}",
                        e,
                        retry + 1,
                        self.max_retries
                    );
                    last_error = e.into();
                }
            }
        }

        Err(last_error)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn generate_text(&self, prompt: &str) -> Result<String, InferenceError> {
        self.generate(&self.text_model, prompt, Vec::new()).await
    }

    async fn generate_from_image(
        &self,
        image: &[u8],
        prompt: &str,
    ) -> Result<String, InferenceError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        self.generate(&self.vision_model, prompt, vec![encoded]).await
    }

    async fn transcribe_audio(
        &self,
        audio: &[u8],
        file_name: &str,
    ) -> Result<String, InferenceError> {
        let mime = mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .to_string();

        let response = self
            .send_with_retry(|| {
                let part = Part::bytes(audio.to_vec())
                    .file_name(file_name.to_string())
                    .mime_str(&mime)
                    .map_err(InferenceError::from)?;
                let form = Form::new()
                    .part("file", part)
                    .text("model", self.transcription_model.clone());
                Ok(self.client.post(&self.transcription_url).multipart(form))
            })
            .await?;

        let body: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Request(format!("failed to parse transcription: {}", e)))?;

        Ok(body.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_generate_request_omits_empty_images() {
        let request = GenerateRequest {
            model: "llama3",
            prompt: "hi",
            stream: false,
            images: Vec::new(),
            options: GenerateOptions { temperature: 0.2 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("images").is_none());
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let config = OrganizerConfig {
            ollama_url: "http://localhost:11434/".into(),
            ..Default::default()
        };
        let backend = OllamaBackend::new(&config).unwrap();
        assert_eq!(backend.base_url, "http://localhost:11434");
    }
}
