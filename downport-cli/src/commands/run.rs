//! `downport run` — invoke the orchestrator directly for a tracked sync.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use downport_core::config::SyncConfig;
use downport_core::types::PrNumber;
use downport_sync::Engine;

use crate::commands::shared::collaborators;
use crate::tracker::ConsoleTracker;

/// Arguments for `downport run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Change-request number to sync.
    #[arg(long)]
    pub pr: u64,
}

impl RunArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let collab = collaborators(config);
        let tracker = ConsoleTracker::default();
        let engine = Engine {
            config,
            store: &collab.store,
            upstream: &collab.upstream,
            downstream: &collab.downstream,
            build: &collab.build,
            tracker: &tracker,
        };

        let summary = engine
            .update_sync(PrNumber(self.pr))
            .with_context(|| format!("sync failed for PR {}", self.pr))?;
        println!(
            "{} PR {}: {} ported, {} skipped, routed to {}",
            "✓".green(),
            summary.pr,
            summary.ported,
            summary.skipped_empty,
            summary.routing,
        );
        Ok(())
    }
}
