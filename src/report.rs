//! Run report rendering
//!
//! Text output for a finished run: the plan as `source -> destination`
//! lines, the proposed directory tree, skipped entries with reasons and the
//! end-of-run counts. `to_json` gives the same data for scripting.

use crate::execution::{RunOutcome, RunSummary};
use crate::models::RunPlan;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Directory node of the proposed tree; files are leaves with no children
#[derive(Debug, Default)]
struct TreeNode {
    children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn insert<'a>(&mut self, mut parts: impl Iterator<Item = &'a str>) {
        if let Some(head) = parts.next() {
            self.children
                .entry(head.to_string())
                .or_default()
                .insert(parts);
        }
    }

    fn render(&self, prefix: &str, out: &mut String) {
        let count = self.children.len();
        for (index, (name, child)) in self.children.iter().enumerate() {
            let last = index + 1 == count;
            let pointer = if last { "└── " } else { "├── " };
            let _ = writeln!(out, "{}{}{}", prefix, pointer, name);
            if !child.children.is_empty() {
                let extension = if last { "    " } else { "│   " };
                child.render(&format!("{}{}", prefix, extension), out);
            }
        }
    }
}

/// One `source -> destination` line per plan entry
pub fn render_plan(plan: &RunPlan) -> String {
    let mut out = String::new();
    for entry in &plan.entries {
        let _ = writeln!(
            out,
            "{} -> {}",
            entry.source.display(),
            entry.destination.display()
        );
    }
    out
}

/// Proposed structure under the output root, `├──`/`└──` style
pub fn render_tree(plan: &RunPlan) -> String {
    let mut root = TreeNode::default();
    for entry in &plan.entries {
        let relative = entry
            .destination
            .strip_prefix(&plan.output_root)
            .unwrap_or(&entry.destination);
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        root.insert(parts.iter().map(String::as_str));
    }

    let mut out = format!("{}\n", plan.output_root.display());
    root.render("", &mut out);
    out
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    if !summary.skipped.is_empty() {
        out.push_str("Skipped:\n");
        for entry in &summary.skipped {
            let _ = writeln!(out, "  {}: {}", entry.source.display(), entry.reason);
        }
    }

    if !summary.failures.is_empty() {
        out.push_str("Failed:\n");
        for failure in &summary.failures {
            let _ = writeln!(
                out,
                "  {} -> {}: {}",
                failure.source.display(),
                failure.destination.display(),
                failure.error
            );
        }
    }

    let heading = if summary.dry_run {
        "Dry run (no files moved)"
    } else {
        "Applied"
    };
    let _ = writeln!(
        out,
        "{}: {} planned, {} moved, {} skipped, {} failed",
        heading,
        summary.planned_count,
        summary.moved_count,
        summary.skipped_count,
        summary.failed_count
    );
    out
}

/// Full human-readable report
pub fn render(outcome: &RunOutcome) -> String {
    let mut out = String::new();

    if outcome.plan.entries.is_empty() {
        out.push_str("No files to organize.\n");
    } else {
        out.push_str("Proposed moves:\n");
        out.push_str(&render_plan(&outcome.plan));
        out.push_str("\nProposed directory structure:\n");
        out.push_str(&render_tree(&outcome.plan));
    }

    out.push('\n');
    out.push_str(&render_summary(&outcome.summary));
    out
}

pub fn to_json(outcome: &RunOutcome) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(outcome)
}
