use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::RuleCatalog;
use crate::core::MigrateError;

const GENERAL_PLAN: &str = include_str!("../../catalogs/general.toml");
const ARDUPILOT_PLAN: &str = include_str!("../../catalogs/ardupilot.toml");

const BUILTIN_PLANS: &[(&str, &str)] = &[("general", GENERAL_PLAN), ("ardupilot", ARDUPILOT_PLAN)];

/// Configuration form of a substitution rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Optional display name
    #[serde(default)]
    pub label: Option<String>,

    /// Regex to search for
    pub pattern: String,

    /// Replacement text
    pub replacement: String,

    /// Let `.` match newlines (for multi-line function bodies)
    #[serde(default)]
    pub dotall: bool,

    /// Expand capture references in the replacement
    #[serde(default)]
    pub expand: bool,
}

/// Files to scan for dependencies that must not be present
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSpec {
    /// Directory the audited files are relative to (itself relative to the root)
    #[serde(default)]
    pub base: PathBuf,

    pub files: Vec<PathBuf>,

    /// Substrings that count as a dependency
    pub forbidden: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PlanDocument {
    name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default = "default_backup_suffix")]
    backup_suffix: String,
    #[serde(default)]
    required_dir: Option<PathBuf>,
    #[serde(default)]
    manual_attention: Vec<PathBuf>,
    #[serde(default)]
    notes: Vec<String>,
    #[serde(default)]
    sections: Vec<SectionDocument>,
    #[serde(default)]
    audit: Option<AuditSpec>,
}

#[derive(Debug, Deserialize)]
struct SectionDocument {
    label: String,
    files: Vec<PathBuf>,
    #[serde(default)]
    flag_marker: Option<String>,
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

/// A group of files sharing one rule catalog
#[derive(Debug, Clone)]
pub struct PlanSection {
    pub label: String,
    pub files: Vec<PathBuf>,

    /// Case-insensitive marker; migrated files containing it are listed for review
    pub flag_marker: Option<String>,

    pub rules: RuleCatalog,
}

/// A named migration configuration: which files, which rules, which backup suffix
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub name: String,
    pub title: String,
    pub description: String,
    pub backup_suffix: String,

    /// Directory that must exist under the root before anything runs
    pub required_dir: Option<PathBuf>,

    /// Files that cannot be migrated by rules and need a human
    pub manual_attention: Vec<PathBuf>,

    pub notes: Vec<String>,
    pub sections: Vec<PlanSection>,
    pub audit: Option<AuditSpec>,
}

impl MigrationPlan {
    /// Parse and compile a plan. `origin` names the source in error messages.
    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self, MigrateError> {
        let doc: PlanDocument = toml::from_str(contents).map_err(|e| MigrateError::PlanParse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;

        if doc.backup_suffix.is_empty() {
            return Err(MigrateError::PlanParse {
                origin: origin.to_string(),
                message: "backup_suffix must not be empty".to_string(),
            });
        }

        let sections = doc
            .sections
            .into_iter()
            .map(|section| -> Result<PlanSection, MigrateError> {
                Ok(PlanSection {
                    rules: RuleCatalog::from_specs(&section.rules)?,
                    label: section.label,
                    files: section.files,
                    flag_marker: section.flag_marker,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            title: doc.title.unwrap_or_else(|| doc.name.clone()),
            name: doc.name,
            description: doc.description,
            backup_suffix: doc.backup_suffix,
            required_dir: doc.required_dir,
            manual_attention: doc.manual_attention,
            notes: doc.notes,
            sections,
            audit: doc.audit,
        })
    }

    /// Load a plan from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, MigrateError> {
        if !path.is_file() {
            return Err(MigrateError::PlanNotFound(path.display().to_string()));
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents, &path.display().to_string())
    }

    /// Resolve a plan by built-in name, configured name, or file path
    pub fn resolve(name_or_path: &str, named: &BTreeMap<String, PathBuf>) -> Result<Self, MigrateError> {
        if let Some(plan) = builtin_plan(name_or_path)? {
            return Ok(plan);
        }

        if let Some(path) = named.get(name_or_path) {
            return Self::from_file(path);
        }

        let path = Path::new(name_or_path);
        if path.is_file() {
            return Self::from_file(path);
        }

        Err(MigrateError::PlanNotFound(name_or_path.to_string()))
    }

    pub fn file_count(&self) -> usize {
        self.sections.iter().map(|s| s.files.len()).sum()
    }

    pub fn rule_count(&self) -> usize {
        self.sections.iter().map(|s| s.rules.len()).sum()
    }
}

/// Look up a plan shipped with the binary
pub fn builtin_plan(name: &str) -> Result<Option<MigrationPlan>, MigrateError> {
    BUILTIN_PLANS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(builtin, contents)| MigrationPlan::from_toml_str(contents, &format!("<builtin:{}>", builtin)))
        .transpose()
}

/// All plans shipped with the binary, in a stable order
pub fn builtin_plans() -> Result<Vec<MigrationPlan>, MigrateError> {
    BUILTIN_PLANS
        .iter()
        .map(|(name, contents)| MigrationPlan::from_toml_str(contents, &format!("<builtin:{}>", name)))
        .collect()
}
