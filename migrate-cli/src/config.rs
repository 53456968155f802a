use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the project-level settings file
pub const PROJECT_CONFIG_FILE: &str = "pegasus-migrate.toml";

/// Tool settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub migrate: MigrateSettings,

    /// Extra plans by name (path to a plan TOML file)
    #[serde(default)]
    pub plans: BTreeMap<String, PathBuf>,
}

/// Defaults for the `migrate` command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateSettings {
    /// Plans run when none is given on the command line
    #[serde(default = "default_plans")]
    pub plans: Vec<String>,

    /// Create backups before modifying files
    #[serde(default = "default_backup")]
    pub backup: bool,

    /// Print unified diffs of changed files
    #[serde(default)]
    pub diff: bool,
}

fn default_plans() -> Vec<String> {
    vec!["general".to_string()]
}

fn default_backup() -> bool {
    true
}

impl Default for MigrateSettings {
    fn default() -> Self {
        Self {
            plans: default_plans(),
            backup: default_backup(),
            diff: false,
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// **Priority (highest to lowest):**
    /// 1. `--config <file>` (must exist)
    /// 2. `<root>/pegasus-migrate.toml`
    /// 3. `~/.config/pegasus-migrate/config.toml`
    /// 4. Hardcoded defaults
    ///
    /// A higher-priority file replaces the lower one entirely.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::debug!("Loading config from: {}", path.display());
            return Self::load_from_file(path);
        }

        let mut settings = Settings::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                tracing::debug!("Loading global config from: {}", global_path.display());
                settings = Self::load_from_file(&global_path)?;
            }
        }

        let project_path = root.join(PROJECT_CONFIG_FILE);
        if project_path.exists() {
            tracing::debug!("Loading project config from: {}", project_path.display());
            settings = Self::load_from_file(&project_path)?;
        }

        Ok(settings)
    }

    /// Load settings from a specific file. Relative plan paths are taken
    /// relative to the file's directory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Some(dir) = path.parent() {
            for plan_path in settings.plans.values_mut() {
                if plan_path.is_relative() {
                    *plan_path = dir.join(&*plan_path);
                }
            }
        }

        Ok(settings)
    }

    /// Global config path (~/.config/pegasus-migrate/config.toml)
    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| {
            home.join(".config")
                .join("pegasus-migrate")
                .join("config.toml")
        })
    }
}
