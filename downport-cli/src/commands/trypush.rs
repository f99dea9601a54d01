//! `downport try-push` — push a synced change request's affected tests to
//! the try server.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use downport_core::capabilities::Vcs;
use downport_core::config::SyncConfig;
use downport_core::types::{PrNumber, SyncDirection};
use downport_sync::trypush;

use crate::commands::shared::collaborators;

/// Arguments for `downport try-push`.
#[derive(Args, Debug)]
pub struct TryPushArgs {
    /// Change-request number to push.
    #[arg(long)]
    pub pr: u64,

    /// Print the try message without committing or pushing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl TryPushArgs {
    pub fn run(self, config: &SyncConfig) -> Result<()> {
        let collab = collaborators(config);
        let state = collab.store.snapshot().context("failed to load sync store")?;
        let sync = state
            .find_sync(
                &config.upstream.name,
                PrNumber(self.pr),
                SyncDirection::Downstream,
            )
            .with_context(|| format!("no sync tracked for PR {}", self.pr))?;

        let Some(source_branch) = &sync.source_branch else {
            bail!("PR {} has no source workspace yet; run `downport run` first", self.pr);
        };
        let Some(target_branch) = &sync.target_branch else {
            bail!("PR {} has no target workspace yet; run `downport run` first", self.pr);
        };

        let source = collab
            .upstream
            .ensure_worktree(source_branch, &config.upstream.baseline_ref)
            .context("failed to open the source workspace")?;
        let affected = trypush::affected_tests(
            &collab.build,
            source.root(),
            Some(&config.upstream.baseline_ref),
        )
        .context("affected-test query failed")?;
        let message = trypush::try_message(&affected);
        println!("{message}");

        if self.dry_run {
            return Ok(());
        }

        let target = collab
            .downstream
            .ensure_worktree(target_branch, &config.downstream.baseline_ref)
            .context("failed to open the target workspace")?;
        match trypush::push_to_try(target.as_ref(), &message)
            .with_context(|| format!("try push failed for PR {}", self.pr))?
        {
            Some(url) => println!("{} results: {url}", "✓".green()),
            None => println!("{} pushed; no results URL in push output", "✓".green()),
        }
        Ok(())
    }
}
