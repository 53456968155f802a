use anyhow::Result;
use std::path::Path;

use pegasus_migrate::config::Settings;
use pegasus_migrate::core::OutputWriter;
use pegasus_migrate::rewriter::{Migrator, RunMode};

use crate::MigrateArgs;

/// Run the requested plans in order. Returns `false` when any file or plan failed.
pub fn run(args: &MigrateArgs, root: &Path, settings: &Settings, output: &OutputWriter) -> Result<bool> {
    let plans = if args.plans.is_empty() {
        settings.migrate.plans.clone()
    } else {
        args.plans.clone()
    };

    let mode = if args.dry_run { RunMode::DryRun } else { RunMode::Apply };
    let show_diff = args.diff || settings.migrate.diff;

    let run = Migrator::new(root)
        .mode(mode)
        .backup(settings.migrate.backup && !args.no_backup)
        .collect_diffs(show_diff)
        .run_plans(&plans, &settings.plans);

    output.write_plan_run(&run, show_diff)?;
    Ok(run.is_success())
}
