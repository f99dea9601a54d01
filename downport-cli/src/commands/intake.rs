//! `downport intake` — register a new change request.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use downport_core::config::SyncConfig;
use downport_core::events::ChangeRequestEvent;
use downport_sync::Engine;

use crate::commands::shared::collaborators;
use crate::tracker::ConsoleTracker;

/// Arguments for `downport intake`.
#[derive(Args, Debug)]
pub struct IntakeArgs {
    /// Path to the change-request event JSON
    /// (`{"changeRequestId": …, "title": …, "body": …}`).
    pub event: PathBuf,
}

impl IntakeArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let raw = std::fs::read_to_string(&self.event)
            .with_context(|| format!("failed to read {}", self.event.display()))?;
        let event: ChangeRequestEvent = serde_json::from_str(&raw)
            .with_context(|| format!("invalid change-request event in {}", self.event.display()))?;

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

        let sync = engine
            .new_change_request(&event)
            .with_context(|| format!("intake failed for PR {}", event.change_request_id))?;
        println!(
            "{} sync created for PR {} ({})",
            "✓".green(),
            sync.pr,
            sync.issue
        );
        Ok(())
    }
}
