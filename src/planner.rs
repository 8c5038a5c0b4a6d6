//! Tree Planner
//!
//! Collects per-file outcomes from the workers into a `RunPlan`. Outcomes are
//! sorted by source path before destinations are reserved, so collision
//! suffixes do not depend on which worker finished first.

use crate::models::{OrganizeMode, PlanEntry, RunPlan, SkippedEntry, SourceFile};
use crate::naming::{NameRegistry, NameTarget};
use std::path::PathBuf;

/// Result of one unit of work
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Planned { file: SourceFile, target: NameTarget },
    Skipped(SkippedEntry),
}

impl FileOutcome {
    pub fn source(&self) -> &std::path::Path {
        match self {
            FileOutcome::Planned { file, .. } => &file.path,
            FileOutcome::Skipped(entry) => &entry.source,
        }
    }
}

pub struct TreePlanner {
    output_root: PathBuf,
    mode: OrganizeMode,
}

impl TreePlanner {
    pub fn new(output_root: PathBuf, mode: OrganizeMode) -> Self {
        Self { output_root, mode }
    }

    pub fn plan(&self, mut outcomes: Vec<FileOutcome>) -> RunPlan {
        outcomes.sort_by(|a, b| a.source().cmp(b.source()));

        let mut registry = NameRegistry::new();
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for outcome in outcomes {
            match outcome {
                FileOutcome::Planned { file, target } => {
                    let destination = registry.assign(&self.output_root, &target);
                    if destination != self.output_root.join(target.relative_path()) {
                        tracing::debug!(
                            "[TreePlanner] Collision for {}, using {}",
                            file.path.display(),
                            destination.display()
                        );
                    }
                    entries.push(PlanEntry {
                        source: file.path,
                        destination,
                        mode: self.mode,
                    });
                }
                FileOutcome::Skipped(entry) => skipped.push(entry),
            }
        }

        tracing::info!(
            planned = entries.len(),
            skipped = skipped.len(),
            mode = %self.mode,
            "[TreePlanner] Plan built"
        );

        RunPlan {
            output_root: self.output_root.clone(),
            mode: self.mode,
            entries,
            skipped,
        }
    }
}
