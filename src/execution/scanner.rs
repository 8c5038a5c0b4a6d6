//! Input enumeration
//!
//! Walks the input root (or takes the single input file), keeps files whose
//! extension maps to a `FileKind`, and records everything else as an
//! `UnsupportedType` skip. Hidden entries and the output directory are never
//! descended into, however the output path was spelled.

use crate::error::{OrganizeError, SkipReason};
use crate::models::{FileKind, InputSource, SkippedEntry};
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Default)]
pub struct ScanResult {
    /// Supported files, in path order
    pub eligible: Vec<(PathBuf, FileKind)>,
    pub unsupported: Vec<SkippedEntry>,
}

pub fn scan_inputs(input: &InputSource, output_root: &Path) -> Result<ScanResult, OrganizeError> {
    let mut result = ScanResult::default();

    match input {
        InputSource::File(path) => {
            if !path.is_file() {
                return Err(OrganizeError::InvalidInput(format!(
                    "input file does not exist or is not a regular file: {}",
                    path.display()
                )));
            }
            classify(path.clone(), &mut result);
        }
        InputSource::Directory(root) => {
            if !root.is_dir() {
                return Err(OrganizeError::InvalidInput(format!(
                    "input directory does not exist or is not a directory: {}",
                    root.display()
                )));
            }

            let resolved_output = resolve_lenient(output_root);
            let walker = WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    entry.depth() == 0
                        || !(is_hidden(entry) || is_output_dir(entry, output_root, &resolved_output))
                });

            for entry in walker {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        classify(entry.into_path(), &mut result)
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("[Scanner] Skipping unreadable entry: {}", e),
                }
            }
        }
    }

    tracing::info!(
        eligible = result.eligible.len(),
        unsupported = result.unsupported.len(),
        "[Scanner] Enumerated {}",
        input.root().display()
    );

    Ok(result)
}

fn classify(path: PathBuf, result: &mut ScanResult) {
    match FileKind::from_path(&path) {
        Some(kind) => result.eligible.push((path, kind)),
        None => {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "no extension".to_string());
            result.unsupported.push(SkippedEntry {
                source: path,
                reason: SkipReason::UnsupportedType(ext),
            });
        }
    }
}

/// Canonical form of a path that may not exist yet: the longest existing
/// ancestor is canonicalized and the remaining components are applied lexically
pub fn resolve_lenient(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        let Ok(mut resolved) = ancestor.canonicalize() else {
            continue;
        };
        let rest = path.strip_prefix(ancestor).unwrap_or(Path::new(""));
        for component in rest.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(part) => resolved.push(part),
                _ => {}
            }
        }
        return resolved;
    }
    path.to_path_buf()
}

fn is_output_dir(entry: &DirEntry, output_root: &Path, resolved_output: &Path) -> bool {
    if entry.path() == output_root {
        return true;
    }
    // Only same-named directories are worth a canonicalize call
    entry.file_type().is_dir()
        && Some(entry.file_name()) == resolved_output.file_name()
        && entry
            .path()
            .canonicalize()
            .map(|p| p == resolved_output)
            .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
