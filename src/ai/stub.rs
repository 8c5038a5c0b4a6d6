//! Deterministic in-process backend
//!
//! Each capability is a plain closure over the prompt, so a test decides
//! exactly what the "model" says. Unconfigured capabilities fail with
//! `InferenceError::Unavailable`.

use super::backend::InferenceBackend;
use crate::error::InferenceError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

type Handler = Box<dyn Fn(&str) -> Result<String, InferenceError> + Send + Sync>;

pub struct StubBackend {
    text: Option<Handler>,
    vision: Option<Handler>,
    audio: Option<Handler>,
    calls: AtomicUsize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            text: None,
            vision: None,
            audio: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer text prompts
    pub fn with_text<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<String, InferenceError> + Send + Sync + 'static,
    {
        self.text = Some(Box::new(f));
        self
    }

    /// Answer image prompts (the image itself is ignored)
    pub fn with_vision<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<String, InferenceError> + Send + Sync + 'static,
    {
        self.vision = Some(Box::new(f));
        self
    }

    /// Answer transcriptions, keyed by file name
    pub fn with_transcription<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<String, InferenceError> + Send + Sync + 'static,
    {
        self.audio = Some(Box::new(f));
        self
    }

    /// Total calls across all capabilities
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn answer(handler: &Option<Handler>, input: &str, capability: &str) -> Result<String, InferenceError> {
    match handler {
        Some(f) => f(input),
        None => Err(InferenceError::Unavailable(format!("stub has no {} handler", capability))),
    }
}

#[async_trait]
impl InferenceBackend for StubBackend {
    async fn generate_text(&self, prompt: &str) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.text, prompt, "text")
    }

    async fn generate_from_image(
        &self,
        _image: &[u8],
        prompt: &str,
    ) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.vision, prompt, "vision")
    }

    async fn transcribe_audio(
        &self,
        _audio: &[u8],
        file_name: &str,
    ) -> Result<String, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.audio, file_name, "transcription")
    }
}
