mod backup;
mod preview;
mod report;

pub use backup::{backup_path, ensure_backup};
pub use preview::unified_diff;
pub use report::{
    FileOutcome, FileStatus, FlaggedFile, MigrationReport, PlanOutcome, PlanReport, PlanRun,
    RunMode, SectionReport, StatusCounts,
};

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::audit::run_audit;
use crate::catalog::{MigrationPlan, RuleCatalog};
use crate::core::MigrateError;

/// Applies rule catalogs to lists of files under a root directory
#[derive(Debug, Clone)]
pub struct Migrator {
    /// Relative paths resolve against this directory
    root: PathBuf,

    mode: RunMode,

    /// Create one-time backups before touching a file
    backup: bool,

    /// Appended to the file name to form the backup path
    backup_suffix: String,

    /// Attach unified diffs to updated outcomes
    collect_diffs: bool,

    /// Case-insensitive marker that flags a file for review
    flag_marker: Option<String>,
}

impl Migrator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode: RunMode::Apply,
            backup: true,
            backup_suffix: ".bak".to_string(),
            collect_diffs: false,
            flag_marker: None,
        }
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn backup(mut self, enabled: bool) -> Self {
        self.backup = enabled;
        self
    }

    pub fn backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    pub fn collect_diffs(mut self, enabled: bool) -> Self {
        self.collect_diffs = enabled;
        self
    }

    pub fn flag_marker(mut self, marker: Option<String>) -> Self {
        self.flag_marker = marker.map(|m| m.to_lowercase());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run `catalog` over `files` in order.
    ///
    /// Every path gets exactly one outcome; a failure on one file never stops
    /// the rest of the list.
    pub fn migrate(&self, files: &[PathBuf], catalog: &RuleCatalog) -> MigrationReport {
        let mut report = MigrationReport::default();

        for listed in files {
            report.push(self.process_file(listed, catalog));
        }

        report
    }

    /// Resolve and run each named plan in order.
    ///
    /// A plan that cannot be loaded or started is recorded as failed and the
    /// remaining plans still run.
    pub fn run_plans(&self, names: &[String], named: &BTreeMap<String, PathBuf>) -> PlanRun {
        let mut run = PlanRun::default();

        for name in names {
            let result = MigrationPlan::resolve(name, named).and_then(|plan| self.run_plan(&plan));

            run.plans.push(match result {
                Ok(report) => PlanOutcome::Completed(report),
                Err(e) => {
                    warn!("Plan '{}' failed: {}", name, e);
                    PlanOutcome::Failed {
                        plan: name.clone(),
                        error: e.to_string(),
                    }
                }
            });
        }

        run
    }

    /// Run every section of `plan` with the plan's backup suffix, then its audit
    pub fn run_plan(&self, plan: &MigrationPlan) -> Result<PlanReport, MigrateError> {
        if let Some(dir) = &plan.required_dir {
            let required = self.root.join(dir);
            if !required.is_dir() {
                return Err(MigrateError::RequiredDirMissing(required));
            }
        }

        info!(
            "Running plan '{}' on {} ({:?}, backup {})",
            plan.name,
            self.root.display(),
            self.mode,
            if self.backup { "enabled" } else { "disabled" }
        );

        let migrator = self.clone().backup_suffix(plan.backup_suffix.clone());

        let mut counts = StatusCounts::default();
        let mut flagged = Vec::new();
        let mut sections = Vec::with_capacity(plan.sections.len());

        for section in &plan.sections {
            debug!("Section '{}': {} files, {} rules", section.label, section.files.len(), section.rules.len());
            let report = migrator
                .clone()
                .flag_marker(section.flag_marker.clone())
                .migrate(&section.files, &section.rules);

            counts.merge(&report.counts);
            if let Some(marker) = &section.flag_marker {
                flagged.extend(report.outcomes.iter().filter(|o| o.flagged).map(|o| FlaggedFile {
                    path: o.path.clone(),
                    marker: marker.clone(),
                }));
            }

            sections.push(SectionReport {
                label: section.label.clone(),
                report,
            });
        }

        let manual_attention = plan
            .manual_attention
            .iter()
            .filter(|path| self.root.join(path).exists())
            .cloned()
            .collect();

        let audit = plan.audit.as_ref().map(|spec| run_audit(&self.root, spec));

        Ok(PlanReport {
            plan: plan.name.clone(),
            title: plan.title.clone(),
            root: self.root.clone(),
            mode: self.mode,
            backup: self.backup,
            backup_suffix: plan.backup_suffix.clone(),
            sections,
            counts,
            flagged,
            manual_attention,
            audit,
            notes: plan.notes.clone(),
        })
    }

    fn process_file(&self, listed: &Path, catalog: &RuleCatalog) -> FileOutcome {
        let resolved = self.root.join(listed);
        let mut outcome = FileOutcome::new(listed.to_path_buf(), resolved.clone(), FileStatus::Unchanged);

        match resolved.try_exists() {
            Ok(true) => {}
            Ok(false) => {
                warn!("File not found: {}", listed.display());
                outcome.status = FileStatus::Missing;
                return outcome;
            }
            Err(e) => {
                outcome.status = FileStatus::Error {
                    reason: format!("Failed to access file: {}: {}", resolved.display(), e),
                };
                return outcome;
            }
        }

        if let Err(e) = self.rewrite(listed, catalog, &mut outcome) {
            warn!("{}: {:#}", listed.display(), e);
            outcome.status = FileStatus::Error {
                reason: format!("{:#}", e),
            };
        }

        outcome
    }

    /// Backup, read, rewrite and (in apply mode) write a single existing file.
    /// The new text is fully computed before anything is written.
    fn rewrite(&self, listed: &Path, catalog: &RuleCatalog, outcome: &mut FileOutcome) -> Result<()> {
        let path = outcome.resolved.clone();

        if self.mode == RunMode::Apply && self.backup {
            outcome.backup = ensure_backup(&path, &self.backup_suffix)?;
        }

        let original = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let (migrated, hits) = catalog.apply(&original);
        outcome.changes = hits;

        if let Some(marker) = &self.flag_marker {
            outcome.flagged = migrated.to_lowercase().contains(marker.as_str());
        }

        if migrated == original {
            debug!("No changes needed: {}", listed.display());
            outcome.status = FileStatus::Unchanged;
            return Ok(());
        }

        if self.collect_diffs {
            outcome.diff = Some(unified_diff(listed, &original, &migrated));
        }

        if self.mode == RunMode::Apply {
            fs::write(&path, &migrated)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            info!("Updated {} ({} rules matched)", listed.display(), outcome.changes.len());
        }

        outcome.status = FileStatus::Updated;
        Ok(())
    }
}
