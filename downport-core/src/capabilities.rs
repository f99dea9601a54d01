//! Capability interfaces for the external collaborators the engine drives.
//!
//! The engine never talks to `git`, the build tooling, or the bug tracker
//! directly; it goes through these traits. `downport-vcs` provides the
//! subprocess-backed implementations; engine tests substitute in-memory
//! mocks.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::{BranchName, IssueRef, RevisionId};

// ---------------------------------------------------------------------------
// Errors and command output
// ---------------------------------------------------------------------------

/// Failure from an external collaborator (command, client, or tool).
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// A command ran and exited nonzero.
    #[error("{program} exited with status {status}: {stderr}")]
    Command {
        program: String,
        status: i32,
        stderr: String,
    },

    /// A command could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A collaborator produced output the caller could not interpret.
    #[error("unexpected output from {program}: {detail}")]
    Parse { program: String, detail: String },

    /// Anything else a collaborator implementation needs to surface.
    #[error("{0}")]
    Other(String),
}

/// Captured result of one external command, kept whole so failures can be
/// attached verbatim to tracker comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

// ---------------------------------------------------------------------------
// Version control
// ---------------------------------------------------------------------------

/// Repository-level version-control capability: one implementor per clone.
pub trait Vcs {
    /// Fetch `refspec` (or everything) from `remote`. `tags: false` maps to
    /// `--no-tags`.
    fn fetch(&self, remote: &str, refspec: Option<&str>, tags: bool)
        -> Result<(), CapabilityError>;

    /// Current tip of `branch`, or `None` if the branch does not exist.
    fn branch_tip(&self, branch: &BranchName) -> Result<Option<RevisionId>, CapabilityError>;

    /// Materialize (or reopen) the worktree for `branch`, creating it at
    /// `baseline` if it does not exist yet. Idempotent.
    fn ensure_worktree(
        &self,
        branch: &BranchName,
        baseline: &str,
    ) -> Result<Box<dyn VcsWorkspace>, CapabilityError>;

    /// Tear down the worktree for `branch`. Missing worktrees are not an
    /// error.
    fn remove_worktree(&self, branch: &BranchName) -> Result<(), CapabilityError>;
}

/// Checkout-level capability over one mutable worktree.
pub trait VcsWorkspace {
    fn root(&self) -> &Path;

    fn branch(&self) -> &BranchName;

    fn current_tip(&self) -> Result<RevisionId, CapabilityError>;

    fn fetch(&self, remote: &str, refspec: Option<&str>, tags: bool)
        -> Result<(), CapabilityError>;

    fn merge(&self, rev: &str) -> Result<(), CapabilityError>;

    fn reset_hard(&self, rev: &str) -> Result<(), CapabilityError>;

    /// Commits reachable from the worktree tip but not from `base`,
    /// oldest first.
    fn commits_between(&self, base: &str) -> Result<Vec<RevisionId>, CapabilityError>;

    /// Render `commit` as a self-contained mailbox-style patch (content plus
    /// author/message metadata).
    fn render_patch(&self, commit: &RevisionId) -> Result<String, CapabilityError>;

    /// Apply a rendered patch, rebasing its paths under `dir_prefix`.
    ///
    /// Application failure is reported through the returned [`CommandOutput`]
    /// (nonzero status), not as an `Err`; `Err` means the tool could not be
    /// invoked at all.
    fn apply_patch(&self, patch: &str, dir_prefix: &Path)
        -> Result<CommandOutput, CapabilityError>;

    /// Whether the worktree has uncommitted changes.
    fn is_dirty(&self) -> Result<bool, CapabilityError>;

    /// Stage `path` (relative to the worktree root).
    fn add(&self, path: &Path) -> Result<(), CapabilityError>;

    /// Commit staged changes. `allow_empty` maps to an empty marker commit
    /// (used by try pushes).
    fn commit(&self, message: &str, allow_empty: bool) -> Result<(), CapabilityError>;

    /// Push the current branch to `remote`, returning the tool's combined
    /// output (push result text commonly arrives on stderr).
    fn push(&self, remote: &str) -> Result<CommandOutput, CapabilityError>;
}

// ---------------------------------------------------------------------------
// Build tooling
// ---------------------------------------------------------------------------

/// The test-suite build-tool capability (manifest regeneration, change
/// queries, path classification).
pub trait BuildTool {
    /// Regenerate manifest/metadata files inside `workdir`.
    fn regenerate_manifest(&self, workdir: &Path) -> Result<(), CapabilityError>;

    /// Relative paths the current checkout changed against its baseline.
    fn files_changed(&self, workdir: &Path) -> Result<BTreeSet<String>, CapabilityError>;

    /// Line-oriented classification report for `paths`: a header line naming
    /// a classification, followed by indented detail lines attributed to it.
    fn classify_paths(&self, workdir: &Path, paths: &[PathBuf])
        -> Result<String, CapabilityError>;

    /// Tab-separated `(path, type)` pairs of tests affected by `revish`.
    fn tests_affected(&self, workdir: &Path, revish: Option<&str>)
        -> Result<String, CapabilityError>;
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// The bug-tracker capability the sync reports through.
pub trait Tracker {
    fn create(
        &self,
        summary: &str,
        body: &str,
        product: &str,
        component: &str,
    ) -> Result<IssueRef, CapabilityError>;

    fn comment(&self, issue: &IssueRef, text: &str) -> Result<(), CapabilityError>;

    fn set_routing(
        &self,
        issue: &IssueRef,
        product: &str,
        component: &str,
    ) -> Result<(), CapabilityError>;
}
