//! Content Extractor
//!
//! Reduces a source file to model-ready input:
//!
//! | Kind                          | Output                                        |
//! |-------------------------------|-----------------------------------------------|
//! | Image                         | JPEG bytes sized for vision                   |
//! | Text, Spreadsheet, Presentation | truncated text excerpt                      |
//! | PDF                           | page text + captions of embedded images       |
//! | Audio                         | transcript from the speech-to-text backend    |
//!
//! Parsing is CPU-bound and runs on the blocking pool; only the PDF caption
//! and audio paths touch the inference backend.

pub mod document_parser;
pub mod metadata;
pub mod pdf;
pub mod vision;

use crate::ai::backend::{bounded, InferenceBackend};
use crate::ai::prompts::PDF_IMAGE_CAPTION_PROMPT;
use crate::config::OrganizerConfig;
use crate::error::ExtractError;
use crate::models::{ExtractedContent, FileKind, OrganizeMode, SourceFile};
use chrono::{DateTime, Local};
use document_parser::{truncate_chars, DocumentParser, TextLayout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Limits applied while extracting
#[derive(Debug, Clone)]
pub struct ExtractLimits {
    pub max_text_chars: usize,
    pub max_pdf_images: usize,
    pub max_image_dimension: u32,
    pub call_timeout: Duration,
}

impl From<&OrganizerConfig> for ExtractLimits {
    fn from(config: &OrganizerConfig) -> Self {
        Self {
            max_text_chars: config.max_text_chars,
            max_pdf_images: config.max_pdf_images,
            max_image_dimension: config.max_image_dimension,
            call_timeout: config.request_timeout(),
        }
    }
}

/// Whether a file's embedded date can affect its destination
///
/// Images carry a date prefix in every mode; other kinds only use it for date folders.
pub fn wants_embedded_date(kind: FileKind, mode: OrganizeMode) -> bool {
    kind == FileKind::Image || mode == OrganizeMode::Date
}

/// Stat a file and, when asked, read its embedded date
pub async fn probe_source_file(
    path: PathBuf,
    kind: FileKind,
    read_embedded: bool,
) -> Result<SourceFile, ExtractError> {
    tokio::task::spawn_blocking(move || {
        let meta = std::fs::metadata(&path).map_err(|source| ExtractError::Read {
            path: path.clone(),
            source,
        })?;
        let modified = meta
            .modified()
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());
        let embedded_date = if read_embedded {
            metadata::read_embedded_date(&path, kind)
        } else {
            None
        };

        Ok::<_, ExtractError>(SourceFile {
            path,
            kind,
            size: meta.len(),
            modified,
            embedded_date,
        })
    })
    .await
    .map_err(|e| ExtractError::parse("file metadata", e))?
}

pub struct ContentExtractor {
    backend: Arc<dyn InferenceBackend>,
    limits: ExtractLimits,
}

impl ContentExtractor {
    pub fn new(backend: Arc<dyn InferenceBackend>, limits: ExtractLimits) -> Self {
        Self { backend, limits }
    }

    pub async fn extract(&self, file: &SourceFile) -> Result<ExtractedContent, ExtractError> {
        match file.kind {
            FileKind::Image => self.extract_image(&file.path).await,
            FileKind::Text | FileKind::Spreadsheet | FileKind::Presentation => {
                self.extract_document(&file.path).await
            }
            FileKind::Pdf => self.extract_pdf(&file.path).await,
            FileKind::Audio => self.extract_audio(file).await,
        }
    }

    async fn extract_image(&self, path: &Path) -> Result<ExtractedContent, ExtractError> {
        let data = read_file(path).await?;
        let max_dimension = self.limits.max_image_dimension;
        let jpeg = blocking(move || vision::prepare_image_for_vision(&data, max_dimension)).await?;
        Ok(ExtractedContent::Image(jpeg))
    }

    async fn extract_document(&self, path: &Path) -> Result<ExtractedContent, ExtractError> {
        let parser = DocumentParser::new(self.limits.max_text_chars);
        let owned = path.to_path_buf();
        let parsed = blocking(move || parser.parse(&owned)).await?;

        Ok(match parsed.layout {
            TextLayout::Prose => ExtractedContent::PlainText(parsed.text),
            TextLayout::Structured => ExtractedContent::StructuredText(parsed.text),
        })
    }

    async fn extract_pdf(&self, path: &Path) -> Result<ExtractedContent, ExtractError> {
        let owned = path.to_path_buf();
        let limits = self.limits.clone();
        let content = blocking(move || {
            pdf::read_pdf(&owned, limits.max_pdf_images, limits.max_image_dimension)
        })
        .await?;

        let mut text = truncate_chars(&content.text(), self.limits.max_text_chars);

        let mut captions = Vec::new();
        for (index, image) in content.images.iter().enumerate() {
            let call = self
                .backend
                .generate_from_image(image, PDF_IMAGE_CAPTION_PROMPT);
            match bounded(self.limits.call_timeout, call).await {
                Ok(caption) => captions.push(format!("Image {}: {}", index + 1, caption)),
                Err(e) => tracing::warn!(
                    "[ContentExtractor] Caption failed for image {} in {}: {}",
                    index + 1,
                    path.display(),
                    e
                ),
            }
        }

        if !captions.is_empty() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str("Visual content:\n");
            text.push_str(&captions.join("\n"));
        }

        if text.trim().is_empty() {
            return Err(ExtractError::Empty);
        }
        Ok(ExtractedContent::StructuredText(text))
    }

    async fn extract_audio(&self, file: &SourceFile) -> Result<ExtractedContent, ExtractError> {
        let data = read_file(&file.path).await?;
        let file_name = file.file_name();
        let call = self.backend.transcribe_audio(&data, &file_name);
        let transcript = bounded(self.limits.call_timeout, call)
            .await
            .map_err(ExtractError::Transcription)?;

        tracing::debug!(
            "[ContentExtractor] Transcribed {} ({} chars)",
            file.path.display(),
            transcript.chars().count()
        );

        Ok(ExtractedContent::Transcript(truncate_chars(
            &transcript,
            self.limits.max_text_chars,
        )))
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ExtractError> {
    tokio::fs::read(path).await.map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })
}

async fn blocking<T, F>(f: F) -> Result<T, ExtractError>
where
    F: FnOnce() -> Result<T, ExtractError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractError::parse("worker", e))?
}
