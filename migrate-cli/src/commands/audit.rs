use anyhow::{Context, Result};
use std::path::Path;

use pegasus_migrate::audit::run_audit;
use pegasus_migrate::catalog::MigrationPlan;
use pegasus_migrate::config::Settings;
use pegasus_migrate::core::OutputWriter;

/// Returns `false` when an audited file references a forbidden namespace
pub fn run(plan: Option<String>, root: &Path, settings: &Settings, output: &OutputWriter) -> Result<bool> {
    let name = plan.unwrap_or_else(|| "ardupilot".to_string());
    let plan = MigrationPlan::resolve(&name, &settings.plans)?;

    let spec = plan
        .audit
        .as_ref()
        .with_context(|| format!("Plan '{}' has no [audit] section", plan.name))?;

    let report = run_audit(root, spec);
    output.write_audit(&plan, &report)?;

    Ok(!report.has_issues())
}
