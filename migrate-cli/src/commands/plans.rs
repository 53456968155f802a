use anyhow::Result;

use pegasus_migrate::catalog::{builtin_plans, MigrationPlan};
use pegasus_migrate::config::Settings;
use pegasus_migrate::core::OutputWriter;

pub fn run(settings: &Settings, output: &OutputWriter) -> Result<()> {
    let mut plans: Vec<(MigrationPlan, String)> = builtin_plans()?
        .into_iter()
        .map(|plan| (plan, "builtin".to_string()))
        .collect();

    for (name, path) in &settings.plans {
        match MigrationPlan::from_file(path) {
            Ok(plan) => plans.push((plan, path.display().to_string())),
            Err(e) => tracing::warn!("Skipping configured plan '{}': {}", name, e),
        }
    }

    output.write_plans(&plans)
}
