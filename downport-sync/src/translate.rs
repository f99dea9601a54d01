//! Commit translator: ports upstream commits onto the target tree.
//!
//! Commits are applied strictly oldest-first because later commits may
//! depend on earlier ones. The first render or apply failure aborts the
//! whole translation; skipping one commit and continuing would silently
//! desynchronize the ported history, so conflicts go to a human instead.

use std::path::Path;

use downport_core::capabilities::VcsWorkspace;
use downport_core::types::RevisionId;

use crate::error::EngineError;

/// Outcome of a completed translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSummary {
    /// Commits applied to the target workspace.
    pub ported: Vec<RevisionId>,
    /// Commits whose rendered patch carried no content change.
    pub skipped_empty: Vec<RevisionId>,
}

/// Port every commit reachable from the source workspace tip but not from
/// `source_baseline` onto the target workspace, rebased under `dir_prefix`.
pub fn translate(
    source: &dyn VcsWorkspace,
    source_baseline: &str,
    target: &dyn VcsWorkspace,
    dir_prefix: &Path,
) -> Result<TranslationSummary, EngineError> {
    let commits = source
        .commits_between(source_baseline)
        .map_err(|e| EngineError::Fetch {
            what: format!("commit list for {}", source.branch()),
            detail: e.to_string(),
        })?;

    let mut summary = TranslationSummary {
        ported: Vec::new(),
        skipped_empty: Vec::new(),
    };

    for commit in commits {
        let patch = source
            .render_patch(&commit)
            .map_err(|e| EngineError::PatchRender {
                commit: commit.clone(),
                detail: e.to_string(),
            })?;

        if is_empty_patch(&patch) {
            // Metadata-only commits become no-ops once intersected with the
            // target tree's path filter.
            tracing::debug!(commit = %commit, "skipping empty patch");
            summary.skipped_empty.push(commit);
            continue;
        }

        let outcome = target
            .apply_patch(&patch, dir_prefix)
            .map_err(|e| EngineError::PatchApply {
                commit: commit.clone(),
                detail: e.to_string(),
            })?;
        if !outcome.success() {
            let mut detail = outcome.stderr.trim().to_owned();
            if detail.is_empty() {
                detail = outcome.stdout.trim().to_owned();
            }
            tracing::error!(commit = %commit, detail = %detail, "patch did not apply");
            return Err(EngineError::PatchApply { commit, detail });
        }

        summary.ported.push(commit);
    }

    Ok(summary)
}

/// A patch with no `diff` section changes nothing; only author/message
/// metadata survived the render.
fn is_empty_patch(patch: &str) -> bool {
    !patch.lines().any(|line| line.starts_with("diff --git"))
}
