//! `downport teardown` — remove the workspaces a sync owns.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use downport_core::config::SyncConfig;
use downport_core::types::PrNumber;
use downport_sync::Engine;

use crate::commands::shared::collaborators;
use crate::tracker::ConsoleTracker;

/// Arguments for `downport teardown`.
#[derive(Args, Debug)]
pub struct TeardownArgs {
    /// Change-request number whose workspaces should be removed.
    #[arg(long)]
    pub pr: u64,
}

impl TeardownArgs {
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

        engine
            .teardown(PrNumber(self.pr))
            .with_context(|| format!("teardown failed for PR {}", self.pr))?;
        println!("{} workspaces removed for PR {}", "✓".green(), self.pr);
        Ok(())
    }
}
