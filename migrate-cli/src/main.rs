use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use pegasus_migrate::config::Settings;
use pegasus_migrate::core::{OutputFormat, OutputWriter};

mod commands;

#[derive(Parser)]
#[command(name = "pegasus-migrate")]
#[command(author, version)]
#[command(
    about = "Migrate PegasusSimulator from Isaac Sim 4.2 to 4.5",
    long_about = "Rewrites omni.isaac.* imports to the isaacsim.* namespace using \
                  regex rule catalogs, keeping a one-time backup of every file it touches. \
                  Runs `migrate` when no command is given."
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Root directory of PegasusSimulator (defaults to current directory)
    #[arg(short = 'r', long, global = true)]
    root: Option<PathBuf>,

    /// Settings file (defaults to <root>/pegasus-migrate.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Options for the default `migrate` run when no command is given
    #[command(flatten)]
    migrate: MigrateArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply migration plans to the listed files
    Migrate(MigrateArgs),

    /// Check that files which must stay simulator-independent have no Isaac Sim imports
    Audit {
        /// Plan whose [audit] section to run (defaults to "ardupilot")
        #[arg(short = 'P', long)]
        plan: Option<String>,
    },

    /// List available migration plans
    Plans,
}

#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Plan name or path to a plan file (repeatable, run in order)
    #[arg(short = 'P', long = "plan")]
    pub plans: Vec<String>,

    /// Show what would be changed without modifying files
    #[arg(long, visible_alias = "preview")]
    pub dry_run: bool,

    /// Skip creating backup files
    #[arg(long)]
    pub no_backup: bool,

    /// Print a unified diff for every changed file
    #[arg(long)]
    pub diff: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--format json` output stays parseable
    let filter = if cli.verbose { "pegasus_migrate=debug" } else { "pegasus_migrate=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let output = OutputWriter::new(cli.format);
    let command = cli.command.unwrap_or(Commands::Migrate(cli.migrate));

    let result = Settings::load(&root, cli.config.as_deref()).and_then(|settings| match command {
        Commands::Migrate(args) => commands::migrate::run(&args, &root, &settings, &output),
        Commands::Audit { plan } => commands::audit::run(plan, &root, &settings, &output),
        Commands::Plans => commands::plans::run(&settings, &output).map(|()| true),
    });

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            output.write_error(&format!("{:#}", e))?;
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_flags_work_without_subcommand() {
        let cli = Cli::try_parse_from(["pegasus-migrate", "--dry-run", "--no-backup", "-P", "ardupilot"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.migrate.dry_run);
        assert!(cli.migrate.no_backup);
        assert_eq!(cli.migrate.plans, vec!["ardupilot".to_string()]);
    }

    #[test]
    fn test_migrate_subcommand_still_parses() {
        let cli = Cli::try_parse_from(["pegasus-migrate", "migrate", "--preview", "--diff"]).unwrap();
        match cli.command {
            Some(Commands::Migrate(args)) => {
                assert!(args.dry_run);
                assert!(args.diff);
            }
            _ => panic!("expected migrate subcommand"),
        }
    }

    #[test]
    fn test_no_arguments_defaults_to_apply() {
        let cli = Cli::try_parse_from(["pegasus-migrate"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.migrate.dry_run);
        assert!(cli.migrate.plans.is_empty());
    }
}
