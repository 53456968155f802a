//! Dependency audit: checks that files which must stay independent of the
//! host simulator do not reference its namespaces.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::catalog::AuditSpec;

/// Result of auditing one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditStatus {
    Clean,
    Contains { found: Vec<String> },
    Missing,
    Error { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditFinding {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: AuditStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub base: PathBuf,
    pub findings: Vec<AuditFinding>,
}

impl AuditReport {
    /// Any audited file references a forbidden namespace
    pub fn has_issues(&self) -> bool {
        self.findings
            .iter()
            .any(|f| matches!(f.status, AuditStatus::Contains { .. }))
    }
}

/// Scan every file of `spec` under `root` for the forbidden substrings
pub fn run_audit(root: &Path, spec: &AuditSpec) -> AuditReport {
    let base = root.join(&spec.base);

    let findings = spec
        .files
        .iter()
        .map(|file| AuditFinding {
            path: file.clone(),
            status: audit_file(&base.join(file), &spec.forbidden),
        })
        .collect();

    AuditReport {
        base: spec.base.clone(),
        findings,
    }
}

fn audit_file(path: &Path, forbidden: &[String]) -> AuditStatus {
    if !path.exists() {
        return AuditStatus::Missing;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return AuditStatus::Error {
                reason: format!("Failed to read file: {}: {}", path.display(), e),
            }
        }
    };

    let found: Vec<String> = forbidden
        .iter()
        .filter(|needle| content.contains(needle.as_str()))
        .cloned()
        .collect();

    debug!("Audited {}: {} forbidden references", path.display(), found.len());

    if found.is_empty() {
        AuditStatus::Clean
    } else {
        AuditStatus::Contains { found }
    }
}
