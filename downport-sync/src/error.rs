//! Error surface for the sync engine.
//!
//! Classification trouble never appears here: the classifier recovers locally
//! by returning the caller's default. Everything below aborts the current
//! sync invocation and is reported as a tracker comment by the orchestrator.

use thiserror::Error;

use downport_core::capabilities::CapabilityError;
use downport_core::error::StoreError;
use downport_core::types::{BranchName, RepoName, RevisionId};

/// A failed sync-processing invocation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A VCS fetch/merge while obtaining source material failed.
    #[error("failed to fetch {what}: {detail}")]
    Fetch { what: String, detail: String },

    /// Workspace creation/lookup failed. Fatal; never retried silently.
    #[error("workspace setup failed for {repository} branch {branch}: {detail}")]
    Workspace {
        repository: RepoName,
        branch: BranchName,
        detail: String,
    },

    /// A commit could not be rendered as a portable patch.
    #[error("failed to create patch from {commit}: {detail}")]
    PatchRender { commit: RevisionId, detail: String },

    /// A rendered patch did not apply to the target workspace.
    #[error("failed to apply patch from {commit}: {detail}")]
    PatchApply { commit: RevisionId, detail: String },

    /// Manifest regeneration (or committing its output) failed.
    #[error("manifest update failed: {0}")]
    MetadataRegen(CapabilityError),

    /// The tracker collaborator rejected an operation.
    #[error("tracker operation failed: {0}")]
    Tracker(CapabilityError),

    /// The state store failed; when this happens during intake, no tracker
    /// issue is left behind.
    #[error("state store failure: {0}")]
    Store(#[from] StoreError),

    /// A try push could not be completed.
    #[error("try push failed: {detail}")]
    TryPush { detail: String },
}
