//! Execution Engine
//!
//! Drives a run end to end:
//! 1. Enumerate inputs (unsupported files become skips)
//! 2. Run probe -> extract -> generate -> synthesize per file on a bounded worker pool
//! 3. Hand sorted outcomes to the tree planner
//! 4. Report (dry run) or move files (apply), one independent operation per entry

use super::context::RunContext;
use super::scanner::scan_inputs;
use crate::ai::backend::InferenceBackend;
use crate::ai::generator::MetadataGenerator;
use crate::config::OrganizerConfig;
use crate::error::{FilesystemFailure, OrganizeError, SkipReason};
use crate::extract::{probe_source_file, wants_embedded_date, ContentExtractor, ExtractLimits};
use crate::models::{FileKind, InputSource, OrganizeMode, RunPlan, SkippedEntry};
use crate::naming;
use crate::planner::{FileOutcome, TreePlanner};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Everything needed to start a run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: InputSource,
    pub output_root: PathBuf,
    pub mode: OrganizeMode,
    pub dry_run: bool,
}

/// A plan entry whose move failed during apply
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: String,
}

/// End-of-run counts and reasons
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub dry_run: bool,
    /// Entries in the plan
    pub planned_count: usize,
    /// Files actually moved (always 0 for a dry run)
    pub moved_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub skipped: Vec<SkippedEntry>,
    pub failures: Vec<FailedEntry>,
    /// No apply failures
    pub success: bool,
}

impl RunSummary {
    pub fn for_dry_run(plan: &RunPlan) -> Self {
        Self::from_parts(plan, 0, Vec::new(), true)
    }

    fn from_parts(plan: &RunPlan, moved: usize, failures: Vec<FailedEntry>, dry_run: bool) -> Self {
        Self {
            dry_run,
            planned_count: plan.entries.len(),
            moved_count: moved,
            skipped_count: plan.skipped.len(),
            failed_count: failures.len(),
            skipped: plan.skipped.clone(),
            success: failures.is_empty(),
            failures,
        }
    }
}

/// Plan plus what happened to it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub plan: RunPlan,
    pub summary: RunSummary,
}

pub struct ExecutionEngine {
    extractor: Arc<ContentExtractor>,
    generator: Arc<MetadataGenerator>,
    context: Arc<RunContext>,
    max_workers: usize,
}

impl ExecutionEngine {
    pub fn new(
        config: &OrganizerConfig,
        backend: Arc<dyn InferenceBackend>,
        context: Arc<RunContext>,
    ) -> Self {
        Self {
            extractor: Arc::new(ContentExtractor::new(
                backend.clone(),
                ExtractLimits::from(config),
            )),
            generator: Arc::new(MetadataGenerator::new(backend, config.request_timeout())),
            context,
            max_workers: config.max_workers.max(1),
        }
    }

    /// Plan, then apply unless this is a dry run
    pub async fn run(&self, request: &RunRequest) -> Result<RunOutcome, OrganizeError> {
        let plan = self.plan(request).await?;
        let summary = if request.dry_run {
            RunSummary::for_dry_run(&plan)
        } else {
            self.apply(&plan).await
        };
        Ok(RunOutcome { plan, summary })
    }

    /// Build the plan without touching the filesystem
    pub async fn plan(&self, request: &RunRequest) -> Result<RunPlan, OrganizeError> {
        let scan = {
            let input = request.input.clone();
            let output_root = request.output_root.clone();
            tokio::task::spawn_blocking(move || scan_inputs(&input, &output_root)).await??
        };

        let total = scan.eligible.len();
        self.context.begin(total);
        tracing::info!(
            files = total,
            workers = self.max_workers,
            mode = %request.mode,
            "[Executor] Processing"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut futures = FuturesUnordered::new();

        for (path, kind) in scan.eligible {
            let sem = semaphore.clone();
            let extractor = self.extractor.clone();
            let generator = self.generator.clone();
            let context = self.context.clone();
            let mode = request.mode;
            let task_path = path.clone();

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                let outcome = process_file(task_path, kind, mode, &extractor, &generator).await;
                context.record(
                    outcome.source(),
                    matches!(outcome, FileOutcome::Skipped(_)),
                );
                outcome
            });

            futures.push(async move { (path, handle.await) });
        }

        let mut outcomes: Vec<FileOutcome> = scan
            .unsupported
            .into_iter()
            .map(FileOutcome::Skipped)
            .collect();

        while let Some((path, joined)) = futures.next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("[Executor] Worker for {} failed: {}", path.display(), e);
                    outcomes.push(FileOutcome::Skipped(SkippedEntry {
                        source: path,
                        reason: SkipReason::ExtractionFailure(format!("worker failed: {}", e)),
                    }));
                }
            }
        }

        Ok(TreePlanner::new(request.output_root.clone(), request.mode).plan(outcomes))
    }

    /// Move every planned file; failures are recorded per entry
    pub async fn apply(&self, plan: &RunPlan) -> RunSummary {
        let mut moved = 0;
        let mut failures = Vec::new();

        for entry in &plan.entries {
            let source = entry.source.clone();
            let destination = entry.destination.clone();
            let result = tokio::task::spawn_blocking(move || perform_move(&source, &destination))
                .await
                .map_err(|e| format!("move task failed: {}", e))
                .and_then(|r| r.map_err(|e| e.to_string()));

            match result {
                Ok(()) => moved += 1,
                Err(error) => {
                    tracing::warn!(
                        "[Executor] Move {} -> {} failed: {}",
                        entry.source.display(),
                        entry.destination.display(),
                        error
                    );
                    failures.push(FailedEntry {
                        source: entry.source.clone(),
                        destination: entry.destination.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            moved = moved,
            failed = failures.len(),
            "[Executor] Apply finished"
        );

        RunSummary::from_parts(plan, moved, failures, false)
    }
}

/// One self-contained unit of work
async fn process_file(
    path: PathBuf,
    kind: FileKind,
    mode: OrganizeMode,
    extractor: &ContentExtractor,
    generator: &MetadataGenerator,
) -> FileOutcome {
    let read_embedded = wants_embedded_date(kind, mode);
    let file = match probe_source_file(path.clone(), kind, read_embedded).await {
        Ok(file) => file,
        Err(e) => {
            return FileOutcome::Skipped(SkippedEntry {
                source: path,
                reason: e.into(),
            })
        }
    };

    let content = if MetadataGenerator::needs_content(&file, mode) {
        match extractor.extract(&file).await {
            Ok(content) => Some(content),
            Err(e) if mode == OrganizeMode::Date => {
                tracing::debug!(
                    "[Executor] No content for date inference on {}: {}",
                    file.path.display(),
                    e
                );
                None
            }
            Err(e) => {
                tracing::warn!("[Executor] Skipping {}: {}", file.path.display(), e);
                return FileOutcome::Skipped(SkippedEntry {
                    source: file.path,
                    reason: e.into(),
                });
            }
        }
    } else {
        None
    };

    let metadata = generator.generate(&file, content.as_ref(), mode).await;
    let target = naming::synthesize(&file, &metadata, mode);

    tracing::debug!(
        "[Executor] {} -> {}",
        file.path.display(),
        target.relative_path().display()
    );

    FileOutcome::Planned { file, target }
}

/// Move a file, creating parent directories; never overwrites
pub fn perform_move(source: &Path, destination: &Path) -> Result<(), FilesystemFailure> {
    if !source.exists() {
        return Err(FilesystemFailure::SourceMissing(source.to_path_buf()));
    }
    if destination.exists() {
        return Err(FilesystemFailure::DestinationExists(destination.to_path_buf()));
    }

    if let Some(parent) = destination.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| FilesystemFailure::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    // Try rename first (same filesystem), fall back to copy+delete
    if fs::rename(source, destination).is_err() {
        fs::copy(source, destination).map_err(FilesystemFailure::Move)?;
        fs::remove_file(source).map_err(FilesystemFailure::Move)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_perform_move_creates_parents() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let dest = dir.path().join("a/b/dest.txt");
        fs::write(&source, "test content").unwrap();

        perform_move(&source, &dest).unwrap();
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "test content");
    }

    #[test]
    fn test_perform_move_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.txt");
        let dest = dir.path().join("dest.txt");
        fs::write(&source, "new").unwrap();
        fs::write(&dest, "old").unwrap();

        let result = perform_move(&source, &dest);
        assert!(matches!(result, Err(FilesystemFailure::DestinationExists(_))));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "old");
        assert!(source.exists());
    }

    #[test]
    fn test_perform_move_missing_source() {
        let dir = tempdir().unwrap();
        let result = perform_move(&dir.path().join("gone"), &dir.path().join("x"));
        assert!(matches!(result, Err(FilesystemFailure::SourceMissing(_))));
    }
}
