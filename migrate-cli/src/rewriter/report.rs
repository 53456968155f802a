use serde::Serialize;
use std::path::PathBuf;

use crate::audit::AuditReport;
use crate::catalog::RuleHit;

/// Migration mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Write backups and rewritten files
    Apply,

    /// Compute the report only
    DryRun,
}

/// Result of processing one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Missing,
    Unchanged,
    Updated,
    Error { reason: String },
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Missing => "missing",
            FileStatus::Unchanged => "unchanged",
            FileStatus::Updated => "updated",
            FileStatus::Error { .. } => "error",
        }
    }
}

/// Everything recorded about one path of the input list
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    /// Path as listed in the input
    pub path: PathBuf,

    /// Path after resolving against the root
    pub resolved: PathBuf,

    #[serde(flatten)]
    pub status: FileStatus,

    /// Rules that matched, in application order
    pub changes: Vec<RuleHit>,

    /// Backup created during this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,

    /// Migrated text contains the plan's review marker
    pub flagged: bool,

    /// Unified diff of the change, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl FileOutcome {
    pub(crate) fn new(path: PathBuf, resolved: PathBuf, status: FileStatus) -> Self {
        Self {
            path,
            resolved,
            status,
            changes: Vec::new(),
            backup: None,
            flagged: false,
            diff: None,
        }
    }
}

/// Per-status totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub updated: usize,
    pub unchanged: usize,
    pub missing: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: &FileStatus) {
        match status {
            FileStatus::Missing => self.missing += 1,
            FileStatus::Unchanged => self.unchanged += 1,
            FileStatus::Updated => self.updated += 1,
            FileStatus::Error { .. } => self.error += 1,
        }
    }

    pub fn merge(&mut self, other: &StatusCounts) {
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.missing += other.missing;
        self.error += other.error;
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} updated, {} unchanged, {} missing, {} error",
            self.updated, self.unchanged, self.missing, self.error
        )
    }
}

/// Ordered outcome of one `migrate` pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    /// Outcomes in input order
    pub outcomes: Vec<FileOutcome>,
    pub counts: StatusCounts,
}

impl MigrationReport {
    pub fn push(&mut self, outcome: FileOutcome) {
        self.counts.record(&outcome.status);
        self.outcomes.push(outcome);
    }

    pub fn updated_count(&self) -> usize {
        self.counts.updated
    }

    pub fn has_errors(&self) -> bool {
        self.counts.error > 0
    }

    pub fn status_of(&self, path: impl AsRef<std::path::Path>) -> Option<&FileStatus> {
        self.outcomes
            .iter()
            .find(|o| o.path == path.as_ref())
            .map(|o| &o.status)
    }
}

/// One plan section's report
#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub label: String,
    #[serde(flatten)]
    pub report: MigrationReport,
}

/// Report of a full plan run
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub plan: String,
    pub title: String,
    pub root: PathBuf,
    pub mode: RunMode,
    pub backup: bool,
    pub backup_suffix: String,
    pub sections: Vec<SectionReport>,
    pub counts: StatusCounts,

    /// Files whose migrated text contains their section's review marker
    pub flagged: Vec<FlaggedFile>,

    /// Manual-attention files that exist under the root
    pub manual_attention: Vec<PathBuf>,

    /// Dependency audit run after the sections, when the plan has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditReport>,

    pub notes: Vec<String>,
}

impl PlanReport {
    pub fn has_errors(&self) -> bool {
        self.counts.error > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedFile {
    pub path: PathBuf,
    pub marker: String,
}

/// A requested plan either ran or could not start
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PlanOutcome {
    Completed(PlanReport),
    Failed { plan: String, error: String },
}

/// Outcome of every plan requested in one invocation, in request order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PlanRun {
    pub plans: Vec<PlanOutcome>,
}

impl PlanRun {
    /// False when a plan failed to start or any file ended with `error`.
    /// Missing files alone do not fail a run.
    pub fn is_success(&self) -> bool {
        self.plans.iter().all(|outcome| match outcome {
            PlanOutcome::Completed(report) => !report.has_errors(),
            PlanOutcome::Failed { .. } => false,
        })
    }
}
