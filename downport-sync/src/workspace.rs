//! Workspace manager: isolated per-sync checkouts.
//!
//! Each sync owns at most one worktree per repository, named
//! deterministically from its change-request id. `ensure` is idempotent and
//! safe across process restarts; `remove` is only ever called explicitly
//! (terminal success or abandonment), never automatically on failure, so a
//! failed sync leaves its checkouts behind for diagnosis.

use downport_core::capabilities::{Vcs, VcsWorkspace};
use downport_core::types::{RepoName, SyncRecord};

use crate::error::EngineError;

/// Which of the sync's two repositories a workspace belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

/// Materialize (or reopen) the workspace for one side of a sync.
///
/// Records the branch name on the sync record the first time the workspace
/// is created; later calls reuse the recorded name, so re-invoking after a
/// restart lands on the same checkout. Creation failure is fatal and
/// propagated to the caller.
pub fn ensure(
    vcs: &dyn Vcs,
    repository: &RepoName,
    sync: &mut SyncRecord,
    side: Side,
    baseline: &str,
) -> Result<Box<dyn VcsWorkspace>, EngineError> {
    let recorded = match side {
        Side::Source => sync.source_branch.clone(),
        Side::Target => sync.target_branch.clone(),
    };
    let branch = recorded.unwrap_or_else(|| sync.branch_name());

    let work = vcs
        .ensure_worktree(&branch, baseline)
        .map_err(|e| EngineError::Workspace {
            repository: repository.clone(),
            branch: branch.clone(),
            detail: e.to_string(),
        })?;

    let slot = match side {
        Side::Source => &mut sync.source_branch,
        Side::Target => &mut sync.target_branch,
    };
    if slot.is_none() {
        *slot = Some(branch.clone());
        sync.touch();
        tracing::info!(pr = %sync.pr, repository = %repository, branch = %branch, "workspace recorded on sync");
    }

    Ok(work)
}

/// Tear down every workspace a sync owns.
pub fn remove(
    upstream: &dyn Vcs,
    downstream: &dyn Vcs,
    sync: &mut SyncRecord,
) -> Result<(), EngineError> {
    if let Some(branch) = sync.source_branch.take() {
        upstream
            .remove_worktree(&branch)
            .map_err(|e| EngineError::Workspace {
                repository: sync.repository.clone(),
                branch: branch.clone(),
                detail: e.to_string(),
            })?;
        sync.touch();
    }
    if let Some(branch) = sync.target_branch.take() {
        downstream
            .remove_worktree(&branch)
            .map_err(|e| EngineError::Workspace {
                repository: sync.repository.clone(),
                branch: branch.clone(),
                detail: e.to_string(),
            })?;
        sync.touch();
    }
    Ok(())
}
