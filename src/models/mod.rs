//! Core data model for an organize run
//!
//! `SourceFile` -> `ExtractedContent` -> `Metadata` -> `PlanEntry`, with
//! `SkippedEntry` collecting everything that dropped out along the way.

use crate::error::SkipReason;
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Detected category of a source file, decided by extension only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    Image,
    Audio,
    Text,
    Spreadsheet,
    Presentation,
    Pdf,
}

impl FileKind {
    /// Map a file extension (case-insensitive, without the dot) to a kind
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tiff" | "tif" => Some(FileKind::Image),
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" => Some(FileKind::Audio),
            "txt" | "md" | "docx" => Some(FileKind::Text),
            "xlsx" | "xls" | "csv" => Some(FileKind::Spreadsheet),
            "pptx" => Some(FileKind::Presentation),
            "pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical folder used by type mode
    pub fn type_folder(self) -> &'static str {
        match self {
            FileKind::Image => "Images",
            FileKind::Audio => "Audio",
            FileKind::Text => "Documents",
            FileKind::Spreadsheet => "Spreadsheets",
            FileKind::Presentation => "Presentations",
            FileKind::Pdf => "PDFs",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Audio => "audio recording",
            FileKind::Text => "text document",
            FileKind::Spreadsheet => "spreadsheet",
            FileKind::Presentation => "presentation",
            FileKind::Pdf => "PDF document",
        }
    }
}

/// A file selected for processing, probed once at the start of its unit of work
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: FileKind,
    pub size: u64,
    pub modified: DateTime<Local>,
    /// Capture/creation date read from the file itself (EXIF, PDF info)
    pub embedded_date: Option<NaiveDate>,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Original extension, case preserved
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
    }
}

/// Model-ready input derived from a source file
#[derive(Debug, Clone)]
pub enum ExtractedContent {
    PlainText(String),
    /// Pages, slides or rows flattened to text
    StructuredText(String),
    /// JPEG bytes sized for the vision backend
    Image(Vec<u8>),
    Transcript(String),
}

impl ExtractedContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExtractedContent::PlainText(t)
            | ExtractedContent::StructuredText(t)
            | ExtractedContent::Transcript(t) => Some(t),
            ExtractedContent::Image(_) => None,
        }
    }
}

/// Organizing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrganizeMode {
    Content,
    Date,
    Type,
}

impl std::fmt::Display for OrganizeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OrganizeMode::Content => "content",
            OrganizeMode::Date => "date",
            OrganizeMode::Type => "type",
        };
        f.write_str(name)
    }
}

/// Structured fields produced by the metadata generator
///
/// Always fully populated: fields the model did not deliver hold sentinel values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub description: String,
    pub category_label: String,
    pub suggested_name: String,
    /// Date estimated by the model from content, if one was asked for and found
    pub inferred_date: Option<NaiveDate>,
}

/// What to scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Directory(PathBuf),
    File(PathBuf),
}

impl InputSource {
    pub fn root(&self) -> &Path {
        match self {
            InputSource::Directory(dir) => dir,
            InputSource::File(file) => file.parent().unwrap_or(file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub mode: OrganizeMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntry {
    pub source: PathBuf,
    pub reason: SkipReason,
}

/// Ordered, collision-free set of moves for one run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPlan {
    pub output_root: PathBuf,
    pub mode: OrganizeMode,
    pub entries: Vec<PlanEntry>,
    pub skipped: Vec<SkippedEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension_is_case_insensitive() {
        assert_eq!(FileKind::from_extension("JPG"), Some(FileKind::Image));
        assert_eq!(FileKind::from_extension("Pdf"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_extension("csv"), Some(FileKind::Spreadsheet));
        assert_eq!(FileKind::from_extension("m4a"), Some(FileKind::Audio));
        assert_eq!(FileKind::from_extension("exe"), None);
        assert_eq!(FileKind::from_path(Path::new("notes")), None);
    }

    #[test]
    fn test_extension_keeps_original_case() {
        let file = SourceFile {
            path: PathBuf::from("/in/IMG_0042.JPG"),
            kind: FileKind::Image,
            size: 1,
            modified: Local::now(),
            embedded_date: None,
        };
        assert_eq!(file.extension().as_deref(), Some("JPG"));
        assert_eq!(file.stem(), "IMG_0042");
    }

    #[test]
    fn test_type_folders() {
        assert_eq!(FileKind::Image.type_folder(), "Images");
        assert_eq!(FileKind::Text.type_folder(), "Documents");
        assert_eq!(FileKind::Pdf.type_folder(), "PDFs");
    }

    #[test]
    fn test_input_root_for_single_file() {
        let input = InputSource::File(PathBuf::from("/data/inbox/report.pdf"));
        assert_eq!(input.root(), Path::new("/data/inbox"));
    }
}
