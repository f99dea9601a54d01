//! `downport event` — feed a CI status notification to the reactor.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use downport_core::config::SyncConfig;
use downport_core::events::StatusEvent;
use downport_core::types::PrNumber;
use downport_sync::{Engine, StatusReaction};

use crate::commands::shared::collaborators;
use crate::tracker::ConsoleTracker;

/// Arguments for `downport event`.
#[derive(Args, Debug)]
pub struct EventArgs {
    /// Path to the status event JSON (`{"context": …, "state": …, "sha": …}`).
    pub event: PathBuf,

    /// Change-request number the status belongs to.
    #[arg(long)]
    pub pr: u64,
}

impl EventArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let raw = std::fs::read_to_string(&self.event)
            .with_context(|| format!("failed to read {}", self.event.display()))?;
        let event: StatusEvent = serde_json::from_str(&raw)
            .with_context(|| format!("invalid status event in {}", self.event.display()))?;

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

        let reaction = engine
            .on_status(PrNumber(self.pr), &event)
            .with_context(|| format!("status handling failed for PR {}", self.pr))?;
        match reaction {
            StatusReaction::IgnoredContext => {
                println!("· ignored: unrecognized CI context '{}'", event.context);
            }
            StatusReaction::IgnoredState => {
                println!("· ignored: nothing to do for this state");
            }
            StatusReaction::AlreadyAtRevision => {
                println!("{} PR {} already at {}", "✓".green(), self.pr, event.sha);
            }
            StatusReaction::Synced(summary) => {
                println!(
                    "{} PR {} synced: {} ported, {} skipped, routed to {}",
                    "✓".green(),
                    self.pr,
                    summary.ported,
                    summary.skipped_empty,
                    summary.routing,
                );
            }
        }
        Ok(())
    }
}
