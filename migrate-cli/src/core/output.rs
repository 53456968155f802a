use anyhow::Result;
use serde::Serialize;

use crate::audit::{AuditReport, AuditStatus};
use crate::catalog::MigrationPlan;
use crate::rewriter::{FileOutcome, FileStatus, PlanOutcome, PlanReport, PlanRun, RunMode, StatusCounts};

const RULE: &str = "============================================================";

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// JSON mode prints one array with an entry per requested plan, failed ones included
    pub fn write_plan_run(&self, run: &PlanRun, show_diff: bool) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(run)?);
            }
            OutputFormat::Text => {
                for (i, outcome) in run.plans.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    match outcome {
                        PlanOutcome::Completed(report) => print!("{}", format_plan_report(report, show_diff)),
                        PlanOutcome::Failed { plan, error } => eprintln!("Error: Plan '{}': {}", plan, error),
                    }
                }
            }
        }
        Ok(())
    }

    pub fn write_audit(&self, plan: &MigrationPlan, report: &AuditReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text => {
                print!("{}", format_audit(&plan.name, report));
            }
        }
        Ok(())
    }

    pub fn write_plans(&self, plans: &[(MigrationPlan, String)]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                #[derive(Serialize)]
                struct PlanSummary<'a> {
                    name: &'a str,
                    source: &'a str,
                    description: &'a str,
                    backup_suffix: &'a str,
                    files: usize,
                    rules: usize,
                    audit: bool,
                }
                let summaries: Vec<PlanSummary> = plans
                    .iter()
                    .map(|(plan, source)| PlanSummary {
                        name: &plan.name,
                        source,
                        description: &plan.description,
                        backup_suffix: &plan.backup_suffix,
                        files: plan.file_count(),
                        rules: plan.rule_count(),
                        audit: plan.audit.is_some(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            }
            OutputFormat::Text => {
                for (plan, source) in plans {
                    println!("{} ({})", plan.name, source);
                    if !plan.description.is_empty() {
                        println!("  {}", plan.description);
                    }
                    println!(
                        "  {} files, {} rules, backups: *{}{}",
                        plan.file_count(),
                        plan.rule_count(),
                        plan.backup_suffix,
                        if plan.audit.is_some() { ", audit" } else { "" }
                    );
                }
            }
        }
        Ok(())
    }

    pub fn write_error(&self, error: &str) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                #[derive(Serialize)]
                struct ErrorResponse {
                    error: String,
                }
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ErrorResponse {
                        error: error.to_string()
                    })?
                );
            }
            OutputFormat::Text => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

/// Human-readable report: every path in input order, then the summary
pub fn format_plan_report(report: &PlanReport, show_diff: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n{}\n{}\n", RULE, report.title, RULE));
    output.push_str(&format!("Root directory: {}\n", report.root.display()));
    output.push_str(&format!(
        "Mode: {}\n",
        if report.mode == RunMode::DryRun { "DRY RUN" } else { "LIVE" }
    ));
    output.push_str(&format!(
        "Backup: {}\n",
        if report.backup {
            format!("ENABLED (*{})", report.backup_suffix)
        } else {
            "DISABLED".to_string()
        }
    ));

    for section in &report.sections {
        output.push_str(&format!("\n📄 {}\n", section.label));
        for outcome in &section.report.outcomes {
            output.push_str(&format_outcome(outcome, show_diff));
        }
    }

    output.push_str(&format!("\n{}\nMigration Summary\n{}\n", RULE, RULE));
    output.push_str(&format_counts(&report.counts));

    if !report.flagged.is_empty() {
        output.push_str(&format!("\n⚠️  Files flagged for review ({}):\n", report.flagged.len()));
        for file in &report.flagged {
            output.push_str(&format!("    • {} (mentions '{}')\n", file.path.display(), file.marker));
        }
    }

    if !report.manual_attention.is_empty() {
        output.push_str("\n🚨 Files requiring manual attention:\n");
        for path in &report.manual_attention {
            output.push_str(&format!("    • {}\n", path.display()));
        }
    }

    if let Some(audit) = &report.audit {
        output.push('\n');
        output.push_str(&format_audit(&report.plan, audit));
    }

    if report.mode == RunMode::DryRun {
        output.push_str("\n📝 This was a DRY RUN - no files were modified\n");
        output.push_str("    Run without --dry-run to apply changes\n");
    }

    if !report.notes.is_empty() {
        output.push_str("\n⚠️  Notes:\n");
        for (i, note) in report.notes.iter().enumerate() {
            output.push_str(&format!("    {}. {}\n", i + 1, note));
        }
    }

    output
}

pub fn format_audit(plan: &str, report: &AuditReport) -> String {
    let mut output = format!("🔍 Verifying {} files in {}...\n", plan, report.base.display());

    for finding in &report.findings {
        let path = finding.path.display();
        output.push_str(&match &finding.status {
            AuditStatus::Clean => format!("  ✅ {} - no forbidden dependencies\n", path),
            AuditStatus::Contains { found } => format!("  ⚠️  {} contains: {}\n", path, found.join(", ")),
            AuditStatus::Missing => format!("  ❌ {} not found\n", path),
            AuditStatus::Error { reason } => format!("  ❌ {}: {}\n", path, reason),
        });
    }

    if report.has_issues() {
        output.push_str("\n⚠️  Forbidden dependencies found\n");
    } else {
        output.push_str("\n✅ Audited files are clean\n");
    }

    output
}

fn format_outcome(outcome: &FileOutcome, show_diff: bool) -> String {
    let path = outcome.path.display();
    let mut output = match &outcome.status {
        FileStatus::Updated => format!(
            "  ✅ updated    {} ({} change{})\n",
            path,
            outcome.changes.len(),
            if outcome.changes.len() == 1 { "" } else { "s" }
        ),
        FileStatus::Unchanged => format!("  ⏭️  unchanged  {}\n", path),
        FileStatus::Missing => format!("  ⚠️  missing    {}\n", path),
        FileStatus::Error { reason } => format!("  ❌ error      {}: {}\n", path, reason),
    };

    if outcome.status == FileStatus::Updated {
        for hit in &outcome.changes {
            let replacement = hit.replacement.lines().next().unwrap_or_default();
            output.push_str(&format!("      • {} → {}\n", first_line(&hit.first_match), replacement));
        }
    }

    if let Some(backup) = &outcome.backup {
        let name = backup
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        output.push_str(&format!("      📋 Backed up to: {}\n", name));
    }

    if show_diff {
        if let Some(diff) = &outcome.diff {
            for line in diff.lines() {
                output.push_str(&format!("      {}\n", line));
            }
        }
    }

    output
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn format_counts(counts: &StatusCounts) -> String {
    format!("✅ Files modified: {}\n{}\n", counts.updated, counts.summary_line())
}
