use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the backup for `path`: the suffix is appended to the full file name
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy `path` next to itself unless a backup already exists.
///
/// Returns the backup path when one was created. An existing backup is never
/// touched, so the first snapshot survives any number of later runs.
pub fn ensure_backup(path: &Path, suffix: &str) -> Result<Option<PathBuf>> {
    let target = backup_path(path, suffix);

    let exists = target
        .try_exists()
        .with_context(|| format!("Failed to check backup: {}", target.display()))?;
    if exists {
        debug!("Backup already present: {}", target.display());
        return Ok(None);
    }

    fs::copy(path, &target)
        .with_context(|| format!("Failed to create backup: {}", target.display()))?;
    debug!("Created backup: {}", target.display());

    Ok(Some(target))
}
