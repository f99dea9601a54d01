//! downport — downstream test-suite sync CLI.
//!
//! # Usage
//!
//! ```text
//! downport intake <event.json>           # new change-request event
//! downport event <status.json> --pr N    # CI status event
//! downport run --pr N                    # run the pipeline directly
//! downport status [--json]               # list tracked syncs
//! downport teardown --pr N               # remove a sync's workspaces
//! downport try-push --pr N               # push affected tests to try
//! downport demo                          # end-to-end smoke scenario
//! ```

mod commands;
mod tracker;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use downport_core::config::{self, SyncConfig};

use commands::{
    demo::DemoArgs, event::EventArgs, intake::IntakeArgs, run::RunArgs, status::StatusArgs,
    teardown::TeardownArgs, trypush::TryPushArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "downport",
    version,
    about = "Port upstream test-suite changes into a downstream tree",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML configuration; defaults to ~/.downport/config.yaml
    /// when present, otherwise built-in defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a newly opened change request and open its tracker issue.
    Intake(IntakeArgs),

    /// Feed a CI status notification to the reactor.
    Event(EventArgs),

    /// Run the sync pipeline for a tracked change request.
    Run(RunArgs),

    /// List tracked syncs and their phases.
    Status(StatusArgs),

    /// Tear down the workspaces a sync owns.
    Teardown(TeardownArgs),

    /// Push the affected tests of a synced change request to try.
    TryPush(TryPushArgs),

    /// Replay the end-to-end scenario against throwaway repositories.
    Demo(DemoArgs),
}

fn load_config(explicit: Option<PathBuf>) -> Result<SyncConfig> {
    if let Some(path) = explicit {
        return config::load_at(&path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    let default_path = dirs::home_dir()
        .map(|home| home.join(".downport").join("config.yaml"))
        .filter(|path| path.exists());
    match default_path {
        Some(path) => config::load_at(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(SyncConfig::default()),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Intake(args) => args.run(&config),
        Commands::Event(args) => args.run(&config),
        Commands::Run(args) => args.run(&config),
        Commands::Status(args) => args.run(&config),
        Commands::Teardown(args) => args.run(&config),
        Commands::TryPush(args) => args.run(&config),
        Commands::Demo(args) => args.run(),
    }
}
