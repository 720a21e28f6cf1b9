//! Project-wide checks for references that cannot resolve reliably.

use std::path::PathBuf;

use glob::Pattern;
use serde::Serialize;

use crate::anchor;
use crate::project::{DuplicateFile, ProjectIndex};

#[derive(Debug, Clone, Default)]
pub struct AuditOptions {
    /// Paths, relative to the root, whose anchors are not checked.
    /// Templates that mention `ANCHOR:` in prose belong here.
    pub skip_anchor_check: Vec<Pattern>,
}

/// A file whose anchor markers are malformed.
#[derive(Debug, Clone, Serialize)]
pub struct AnchorProblem {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub files_scanned: usize,
    pub duplicate_files: Vec<DuplicateFile>,
    pub anchor_problems: Vec<AnchorProblem>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_files.is_empty() && self.anchor_problems.is_empty()
    }
}

/// Find duplicate file names and files with duplicate or unbalanced anchors.
pub fn audit(index: &ProjectIndex, options: &AuditOptions) -> AuditReport {
    let mut report = AuditReport {
        duplicate_files: index.duplicate_files(),
        ..Default::default()
    };

    for rel in index.paths() {
        if options
            .skip_anchor_check
            .iter()
            .any(|p| p.matches_path(&rel))
        {
            tracing::debug!(path = %rel.display(), "anchor check skipped");
            continue;
        }
        let full = index.root().join(&rel);
        let text = match std::fs::read_to_string(&full) {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(path = %full.display(), error = %err, "skipping unreadable file");
                continue;
            }
        };
        report.files_scanned += 1;

        if let Err(err) = anchor::parse_anchors(&text) {
            tracing::warn!(path = %rel.display(), error = %err, "anchor problem");
            report.anchor_problems.push(AnchorProblem {
                path: rel,
                error: err.to_string(),
            });
        }
    }

    tracing::info!(
        files = report.files_scanned,
        duplicate_files = report.duplicate_files.len(),
        anchor_problems = report.anchor_problems.len(),
        "audit finished"
    );
    report
}
