use similar::TextDiff;
use std::path::Path;

/// Unified diff between the original and migrated text of `path`
pub fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let name = path.display().to_string();
    let original = format!("a/{}", name);
    let migrated = format!("b/{}", name);

    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(2)
        .header(&original, &migrated)
        .to_string()
}
