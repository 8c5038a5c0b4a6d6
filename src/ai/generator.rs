//! Metadata Generator
//!
//! Turns extracted content into `Metadata` for the selected mode:
//! - Content: description, folder category and filename from the model.
//!   Images take two calls (vision description, then text naming).
//! - Date: asks the model for a date only when the file carries none itself.
//!   Images are described by the vision model first and dated from that text.
//! - Type: no inference at all.
//!
//! Inference problems never fail a file here. Missing fields fall back to
//! sentinels: `Uncategorized` for the folder, `Untitled_<mtime>` for the name.

use super::backend::{bounded, InferenceBackend};
use super::prompts;
use super::utils::{parse_date_response, parse_metadata_response, ResponseFields};
use crate::models::{ExtractedContent, Metadata, OrganizeMode, SourceFile};
use crate::naming::{dates, UNCATEGORIZED};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

pub struct MetadataGenerator {
    backend: Arc<dyn InferenceBackend>,
    call_timeout: Duration,
}

impl MetadataGenerator {
    pub fn new(backend: Arc<dyn InferenceBackend>, call_timeout: Duration) -> Self {
        Self {
            backend,
            call_timeout,
        }
    }

    /// Whether `generate` would use extracted content for this file and mode
    pub fn needs_content(file: &SourceFile, mode: OrganizeMode) -> bool {
        match mode {
            OrganizeMode::Content => true,
            OrganizeMode::Date => dates::intrinsic_date(file).is_none(),
            OrganizeMode::Type => false,
        }
    }

    pub async fn generate(
        &self,
        file: &SourceFile,
        content: Option<&ExtractedContent>,
        mode: OrganizeMode,
    ) -> Metadata {
        match mode {
            OrganizeMode::Content => self.by_content(file, content).await,
            OrganizeMode::Date => self.by_date(file, content).await,
            OrganizeMode::Type => Metadata {
                description: String::new(),
                category_label: file.kind.type_folder().to_string(),
                suggested_name: file.stem(),
                inferred_date: None,
            },
        }
    }

    async fn by_content(&self, file: &SourceFile, content: Option<&ExtractedContent>) -> Metadata {
        let fields = match content {
            Some(ExtractedContent::Image(image)) => self.describe_image(file, image).await,
            Some(text_content) => match text_content.as_text() {
                Some(text) => {
                    let prompt = prompts::build_content_prompt(file.kind, &file.file_name(), text);
                    self.ask(file, &prompt).await.unwrap_or_default()
                }
                None => ResponseFields::default(),
            },
            None => ResponseFields::default(),
        };

        with_sentinels(file, fields)
    }

    /// Vision description first, then a text call for folder, filename and date
    async fn describe_image(&self, file: &SourceFile, image: &[u8]) -> ResponseFields {
        let Some(description) = self.vision_description(file, image).await else {
            return ResponseFields::default();
        };

        let prompt = prompts::build_image_naming_prompt(&file.file_name(), &description);
        let mut fields = self.ask(file, &prompt).await.unwrap_or_default();
        fields.description.get_or_insert(description);
        fields
    }

    async fn vision_description(&self, file: &SourceFile, image: &[u8]) -> Option<String> {
        let call = self
            .backend
            .generate_from_image(image, prompts::IMAGE_DESCRIPTION_PROMPT);
        match bounded(self.call_timeout, call).await {
            Ok(description) => Some(description),
            Err(e) => {
                tracing::warn!(
                    "[MetadataGenerator] Vision failed for {}: {}",
                    file.path.display(),
                    e
                );
                None
            }
        }
    }

    async fn by_date(&self, file: &SourceFile, content: Option<&ExtractedContent>) -> Metadata {
        let inferred_date = match content {
            _ if dates::intrinsic_date(file).is_some() => None,
            Some(ExtractedContent::Image(image)) => match self.vision_description(file, image).await {
                Some(description) => self.infer_date(file, &description).await,
                None => None,
            },
            Some(other) => match other.as_text() {
                Some(text) => self.infer_date(file, text).await,
                None => None,
            },
            None => None,
        };

        Metadata {
            description: String::new(),
            category_label: String::new(),
            suggested_name: file.stem(),
            inferred_date,
        }
    }

    async fn infer_date(&self, file: &SourceFile, text: &str) -> Option<NaiveDate> {
        let prompt = prompts::build_date_prompt(text);
        let call = self.backend.generate_text(&prompt);
        match bounded(self.call_timeout, call).await {
            Ok(answer) => {
                let date = parse_date_response(&answer);
                tracing::debug!(
                    "[MetadataGenerator] Inferred date {:?} for {}",
                    date,
                    file.path.display()
                );
                date
            }
            Err(e) => {
                tracing::warn!(
                    "[MetadataGenerator] Date inference failed for {}: {}",
                    file.path.display(),
                    e
                );
                None
            }
        }
    }

    async fn ask(&self, file: &SourceFile, prompt: &str) -> Option<ResponseFields> {
        let call = self.backend.generate_text(prompt);
        match bounded(self.call_timeout, call).await {
            Ok(answer) => {
                let fields = parse_metadata_response(&answer);
                if fields.category.is_none() || fields.filename.is_none() {
                    tracing::debug!(
                        "[MetadataGenerator] Incomplete response for {}: {:?}",
                        file.path.display(),
                        answer
                    );
                }
                Some(fields)
            }
            Err(e) => {
                tracing::warn!(
                    "[MetadataGenerator] Inference failed for {}, using sentinels: {}",
                    file.path.display(),
                    e
                );
                None
            }
        }
    }
}

/// Sentinel filename stem: `Untitled_<mtime as YYYYMMDD_HHMMSS>`
pub fn sentinel_name(file: &SourceFile) -> String {
    format!("Untitled_{}", file.modified.format("%Y%m%d_%H%M%S"))
}

fn with_sentinels(file: &SourceFile, fields: ResponseFields) -> Metadata {
    Metadata {
        description: fields.description.unwrap_or_default(),
        category_label: fields
            .category
            .unwrap_or_else(|| UNCATEGORIZED.to_string()),
        suggested_name: fields.filename.unwrap_or_else(|| sentinel_name(file)),
        inferred_date: fields.date,
    }
}
