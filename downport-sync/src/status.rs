//! CI status reactor: idempotent entry point for status notifications.
//!
//! Only the single recognized CI context is acted on. A `pending` event
//! whose revision already matches the source workspace tip is a no-op; this
//! is the guard that makes back-to-back identical events re-run nothing.

use downport_core::error::StoreError;
use downport_core::events::{StatusEvent, StatusState};
use downport_core::types::{PrNumber, SyncDirection, SyncRecord};

use crate::error::EngineError;
use crate::orchestrator::SyncSummary;
use crate::Engine;

/// What the reactor decided to do with an event.
#[derive(Debug)]
pub enum StatusReaction {
    /// Context did not match the recognized CI context.
    IgnoredContext,
    /// A state other than `pending` that carries no work (including
    /// `passed`, reserved for future try-push automation).
    IgnoredState,
    /// The workspace already reflects the event's revision.
    AlreadyAtRevision,
    /// The workspace was stale (or absent); a full sync ran.
    Synced(SyncSummary),
}

impl Engine<'_> {
    /// React to a CI status notification for `pr`.
    pub fn on_status(
        &self,
        pr: PrNumber,
        event: &StatusEvent,
    ) -> Result<StatusReaction, EngineError> {
        if event.context != self.config.ci.context {
            tracing::info!(context = %event.context, "ignoring status for unrecognized context");
            return Ok(StatusReaction::IgnoredContext);
        }

        match &event.state {
            StatusState::Pending => {
                let state = self.store.snapshot()?;
                let sync = state
                    .find_sync(&self.config.upstream.name, pr, SyncDirection::Downstream)
                    .ok_or(StoreError::SyncNotFound { pr })?;

                if self.is_workspace_at(sync, &event.sha) {
                    tracing::info!(pr = %pr, sha = %event.sha, "workspace already at revision");
                    return Ok(StatusReaction::AlreadyAtRevision);
                }
                let summary = self.update_sync(pr)?;
                Ok(StatusReaction::Synced(summary))
            }
            StatusState::Passed => {
                // Reserved: a passed upstream run would start a try push.
                Ok(StatusReaction::IgnoredState)
            }
            StatusState::Other(state) => {
                tracing::info!(pr = %pr, state = %state, "ignoring status state");
                Ok(StatusReaction::IgnoredState)
            }
        }
    }

    /// Whether the sync's source workspace tip equals `sha`. No workspace
    /// (or an unanswerable tip query) counts as stale: re-running is safe,
    /// skipping work is not.
    fn is_workspace_at(&self, sync: &SyncRecord, sha: &str) -> bool {
        let Some(branch) = &sync.source_branch else {
            return false;
        };
        match self.upstream.branch_tip(branch) {
            Ok(Some(tip)) => tip.0 == sha,
            Ok(None) => false,
            Err(err) => {
                tracing::warn!(branch = %branch, error = %err, "tip lookup failed; treating workspace as stale");
                false
            }
        }
    }
}
