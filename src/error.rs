//! Error Types
//!
//! Three layers of failure:
//! - `InferenceError`: a single backend call went wrong (timeout, HTTP, empty reply)
//! - `ExtractError`: a supported file could not be reduced to model input
//! - `OrganizeError`: the run as a whole cannot start (bad input root, bad config)
//!
//! Per-file problems never surface as `OrganizeError`; they become a
//! `SkipReason` on the plan or a failed entry in the run summary.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of one call to the inference backend
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference call timed out after {0}s")]
    Timeout(u64),

    #[error("inference request failed: {0}")]
    Request(String),

    #[error("inference backend returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("inference backend returned an empty response")]
    EmptyResponse,

    #[error("inference capability unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        InferenceError::Request(err.to_string())
    }
}

/// Failure to turn a source file into model-ready content
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format}: {message}")]
    Parse { format: &'static str, message: String },

    #[error("no usable content extracted")]
    Empty,

    #[error("transcription failed: {0}")]
    Transcription(#[source] InferenceError),
}

impl ExtractError {
    pub(crate) fn parse(format: &'static str, message: impl fmt::Display) -> Self {
        ExtractError::Parse {
            format,
            message: message.to_string(),
        }
    }
}

/// Why a file was left out of the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum SkipReason {
    /// Extension is not in the supported set
    UnsupportedType(String),
    /// The file could not be read or parsed
    ExtractionFailure(String),
    /// Inference was required to produce any content and it failed
    InferenceFailure(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedType(ext) => write!(f, "unsupported type ({})", ext),
            SkipReason::ExtractionFailure(msg) => write!(f, "extraction failed: {}", msg),
            SkipReason::InferenceFailure(msg) => write!(f, "inference failed: {}", msg),
        }
    }
}

impl From<ExtractError> for SkipReason {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Unsupported(ext) => SkipReason::UnsupportedType(ext),
            ExtractError::Transcription(inner) => SkipReason::InferenceFailure(inner.to_string()),
            other => SkipReason::ExtractionFailure(other.to_string()),
        }
    }
}

/// Apply-time failure for a single plan entry
#[derive(Debug, Error)]
pub enum FilesystemFailure {
    #[error("source no longer exists: {0}")]
    SourceMissing(PathBuf),

    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move file: {0}")]
    Move(#[source] std::io::Error),
}

/// Fatal, run-level errors reported before any file is processed
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{context} {path}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_error_maps_to_inference_skip() {
        let err = ExtractError::Transcription(InferenceError::Timeout(30));
        let reason = SkipReason::from(err);
        assert!(matches!(reason, SkipReason::InferenceFailure(ref msg) if msg.contains("30s")));
    }

    #[test]
    fn test_parse_error_maps_to_extraction_skip() {
        let reason = SkipReason::from(ExtractError::parse("DOCX", "bad zip"));
        assert_eq!(
            reason,
            SkipReason::ExtractionFailure("failed to parse DOCX: bad zip".to_string())
        );
    }

    #[test]
    fn test_skip_reason_serializes_tagged() {
        let json = serde_json::to_string(&SkipReason::UnsupportedType("exe".into())).unwrap();
        assert_eq!(json, r#"{"kind":"unsupportedType","detail":"exe"}"#);
    }
}
