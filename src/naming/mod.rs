//! Name Synthesizer
//!
//! Turns generator output into filesystem-safe relative destinations and
//! keeps them unique within a plan. Uniqueness is decided against the names
//! already handed out in this plan, never against the filesystem.

pub mod dates;

use crate::models::{FileKind, Metadata, OrganizeMode, SourceFile};
use dates::resolve_date;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maximum characters in a synthesized filename stem
pub const MAX_STEM_CHARS: usize = 64;

/// Folder used when the model gave no usable category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A destination relative to the output root, before collision resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTarget {
    pub folder: PathBuf,
    pub stem: String,
    pub extension: Option<String>,
}

impl NameTarget {
    pub fn file_name(&self, stem: &str) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{}", stem, ext),
            None => stem.to_string(),
        }
    }

    pub fn relative_path(&self) -> PathBuf {
        self.folder.join(self.file_name(&self.stem))
    }
}

/// Normalize one path component
///
/// Illegal and control characters are dropped, whitespace runs become a single
/// `_`, leading/trailing separators and dots are trimmed, and the result is
/// capped at `MAX_STEM_CHARS` characters.
pub fn normalize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_gap = false;

    for c in raw.chars() {
        if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control() {
            if c.is_whitespace() {
                pending_gap = true;
            }
            continue;
        }
        if c.is_whitespace() || c == '_' {
            pending_gap = true;
            continue;
        }
        if pending_gap && !out.is_empty() {
            out.push('_');
        }
        pending_gap = false;
        out.push(c);
    }

    let trimmed = out.trim_matches(|c| c == '_' || c == '.' || c == '-');
    let capped: String = trimmed.chars().take(MAX_STEM_CHARS).collect();
    capped.trim_end_matches(|c| c == '_' || c == '.' || c == '-').to_string()
}

/// Drop an extension the model may have appended to its filename suggestion
fn strip_suggested_extension(name: &str) -> &str {
    if let Some(dot_pos) = name.rfind('.') {
        let potential_ext = &name[dot_pos + 1..];
        if (1..=5).contains(&potential_ext.len())
            && potential_ext.chars().all(|c| c.is_ascii_alphanumeric())
            && dot_pos > 0
        {
            return &name[..dot_pos];
        }
    }
    name
}

/// Build the folder + stem for one file under the given mode
pub fn synthesize(file: &SourceFile, metadata: &Metadata, mode: OrganizeMode) -> NameTarget {
    let original_stem = normalize_component(&file.stem());
    let original_stem = if original_stem.is_empty() {
        "file".to_string()
    } else {
        original_stem
    };

    let (folder, stem) = match mode {
        OrganizeMode::Content => {
            let category = normalize_component(&metadata.category_label);
            let category = if category.is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                category
            };
            let stem = normalize_component(strip_suggested_extension(&metadata.suggested_name));
            let stem = if stem.is_empty() { original_stem } else { stem };
            (PathBuf::from(category), stem)
        }
        OrganizeMode::Date => {
            let date = resolve_date(file, metadata.inferred_date).date;
            let folder = PathBuf::from(date.format("%Y").to_string())
                .join(date.format("%Y-%m").to_string());
            (folder, original_stem)
        }
        OrganizeMode::Type => (PathBuf::from(file.kind.type_folder()), original_stem),
    };

    let stem = if file.kind == FileKind::Image {
        let token = resolve_date(file, metadata.inferred_date)
            .date
            .format("%Y-%m-%d")
            .to_string();
        if stem.starts_with(&token) {
            stem
        } else {
            format!("{}_{}", token, stem)
        }
    } else {
        stem
    };

    NameTarget {
        folder,
        stem,
        extension: file.extension(),
    }
}

/// Destinations handed out so far in one plan
#[derive(Debug, Default)]
pub struct NameRegistry {
    assigned: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique path under `root`, suffixing `_1`, `_2`, ... on collision
    ///
    /// Comparison is case-insensitive so the plan stays valid on
    /// case-insensitive filesystems.
    pub fn assign(&mut self, root: &Path, target: &NameTarget) -> PathBuf {
        let mut stem = target.stem.clone();
        let mut counter = 0usize;

        loop {
            let relative = target.folder.join(target.file_name(&stem));
            let key = relative.to_string_lossy().to_lowercase();
            if self.assigned.insert(key) {
                return root.join(relative);
            }
            counter += 1;
            stem = format!("{}_{}", target.stem, counter);
        }
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
