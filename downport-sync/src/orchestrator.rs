//! Sync orchestrator: the state machine that drives one sync to completion.
//!
//! Phases: `pending-intake → fetching-source → translating →
//! updating-metadata → classifying → reported`, with `error` reachable from
//! any non-terminal phase. One invocation runs inside one store transaction,
//! so a crash leaves either the pre-invocation record or the fully updated
//! one. Failures are posted to the tracker issue as a comment and returned
//! to the caller; workspaces stay behind for diagnosis.

use serde::Serialize;

use downport_core::capabilities::VcsWorkspace;
use downport_core::error::StoreError;
use downport_core::types::{PrNumber, RoutingDecision, SyncDirection, SyncPhase, SyncRecord};

use crate::error::EngineError;
use crate::{classify, translate, workspace, Engine};

/// What a completed sync invocation did.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub pr: PrNumber,
    pub ported: usize,
    pub skipped_empty: usize,
    pub routing: RoutingDecision,
}

impl Engine<'_> {
    /// Run the full pipeline for an existing sync.
    ///
    /// On failure the tracker issue gets a comment naming the change request
    /// and the offending commit or diagnostic, the sync is marked `error`,
    /// and the error is returned; nothing is rolled back on disk.
    pub fn update_sync(&self, pr: PrNumber) -> Result<SyncSummary, EngineError> {
        let result = self.store.with_transaction(|state| {
            let sync = state
                .find_sync_mut(&self.config.upstream.name, pr, SyncDirection::Downstream)
                .ok_or(StoreError::SyncNotFound { pr })?;
            self.process(sync)
        });

        match result {
            Ok(summary) => {
                tracing::info!(
                    pr = %pr,
                    ported = summary.ported,
                    routing = %summary.routing,
                    "sync reported",
                );
                Ok(summary)
            }
            Err(err) => {
                self.report_failure(pr, &err);
                Err(err)
            }
        }
    }

    fn process(&self, sync: &mut SyncRecord) -> Result<SyncSummary, EngineError> {
        let config = self.config;

        sync.phase = SyncPhase::FetchingSource;
        sync.touch();
        let source_work = self.fetch_source(sync)?;

        // Changed files are an upstream-relative query; capture them now,
        // before translation starts mutating the target tree.
        let files_changed = match self.build.files_changed(source_work.root()) {
            Ok(files) => files,
            Err(err) => {
                tracing::warn!(error = %err, "files-changed query failed; routing will use default");
                Default::default()
            }
        };

        self.downstream
            .fetch(&config.downstream.remote, None, true)
            .map_err(|e| EngineError::Fetch {
                what: format!("{} baseline", config.downstream.name),
                detail: e.to_string(),
            })?;
        let target_work = workspace::ensure(
            self.downstream,
            &config.downstream.name,
            sync,
            workspace::Side::Target,
            &config.downstream.baseline_ref,
        )?;
        target_work
            .reset_hard(&config.downstream.baseline_ref)
            .map_err(|e| EngineError::Fetch {
                what: format!("{} baseline checkout", config.downstream.name),
                detail: e.to_string(),
            })?;

        sync.phase = SyncPhase::Translating;
        sync.touch();
        let translation = translate::translate(
            source_work.as_ref(),
            &config.upstream.baseline_ref,
            target_work.as_ref(),
            &config.downstream.test_root,
        )?;

        sync.phase = SyncPhase::UpdatingMetadata;
        sync.touch();
        self.commit_metadata_update(target_work.as_ref())?;

        sync.phase = SyncPhase::Classifying;
        sync.touch();
        let decision = classify::classify(
            self.build,
            target_work.root(),
            &config.downstream.test_root,
            &files_changed,
            &config.routing.default_decision(),
        );
        self.tracker
            .set_routing(&sync.issue, &decision.product, &decision.component)
            .map_err(EngineError::Tracker)?;

        sync.phase = SyncPhase::Reported;
        sync.touch();

        Ok(SyncSummary {
            pr: sync.pr,
            ported: translation.ported.len(),
            skipped_empty: translation.skipped_empty.len(),
            routing: decision,
        })
    }

    /// Bring the source workspace to the change request's merged head.
    ///
    /// Any VCS failure in here aborts the invocation; this is the only place
    /// an upstream fetch problem is reported, and the sync never proceeds on
    /// stale source material.
    fn fetch_source(
        &self,
        sync: &mut SyncRecord,
    ) -> Result<Box<dyn VcsWorkspace>, EngineError> {
        let up = &self.config.upstream;
        let pr = sync.pr;
        let fetch_err = |detail: String| EngineError::Fetch {
            what: format!("PR {pr} from {}", up.name),
            detail,
        };

        self.upstream
            .fetch(&up.remote, Some(&up.branch), false)
            .map_err(|e| fetch_err(e.to_string()))?;

        let work = workspace::ensure(
            self.upstream,
            &up.name,
            sync,
            workspace::Side::Source,
            &up.baseline_ref,
        )?;
        work.reset_hard(&up.baseline_ref)
            .map_err(|e| fetch_err(e.to_string()))?;

        let pull_ref = format!("pull/{pr}/head:heads/pull_{pr}");
        work.fetch(&up.remote, Some(&pull_ref), false)
            .map_err(|e| fetch_err(e.to_string()))?;
        work.merge(&format!("heads/pull_{pr}"))
            .map_err(|e| fetch_err(e.to_string()))?;

        Ok(work)
    }

    /// Regenerate manifest files and, if anything changed, commit them as a
    /// single dedicated commit so ported history stays a 1:1 mirror of
    /// upstream.
    fn commit_metadata_update(&self, work: &dyn VcsWorkspace) -> Result<(), EngineError> {
        work.reset_hard("HEAD")
            .map_err(EngineError::MetadataRegen)?;
        self.build
            .regenerate_manifest(work.root())
            .map_err(EngineError::MetadataRegen)?;

        if work.is_dirty().map_err(EngineError::MetadataRegen)? {
            work.add(&self.config.downstream.meta_root)
                .map_err(EngineError::MetadataRegen)?;
            let message = format!("[wpt-sync] downstream {}: update manifest", work.branch());
            work.commit(&message, false)
                .map_err(EngineError::MetadataRegen)?;
        }
        Ok(())
    }

    /// Explicit cleanup after terminal success or abandonment. Never invoked
    /// automatically on failure.
    pub fn teardown(&self, pr: PrNumber) -> Result<(), EngineError> {
        self.store.with_transaction(|state| {
            let sync = state
                .find_sync_mut(&self.config.upstream.name, pr, SyncDirection::Downstream)
                .ok_or(StoreError::SyncNotFound { pr })?;
            workspace::remove(self.upstream, self.downstream, sync)
        })
    }

    /// Post the failure to the tracker issue and mark the sync `error`.
    /// Both are best-effort; the original error is what the caller sees.
    fn report_failure(&self, pr: PrNumber, err: &EngineError) {
        tracing::error!(pr = %pr, error = %err, "sync invocation failed");

        let issue = self.store.snapshot().ok().and_then(|state| {
            state
                .find_sync(&self.config.upstream.name, pr, SyncDirection::Downstream)
                .map(|sync| sync.issue.clone())
        });
        if let Some(issue) = issue {
            let comment = failure_comment(self.config, pr, err);
            if let Err(comment_err) = self.tracker.comment(&issue, &comment) {
                tracing::error!(pr = %pr, error = %comment_err, "failed to post failure comment");
            }
        }

        let marked = self.store.with_transaction::<_, StoreError>(|state| {
            if let Some(sync) =
                state.find_sync_mut(&self.config.upstream.name, pr, SyncDirection::Downstream)
            {
                sync.phase = SyncPhase::Error;
                sync.touch();
            }
            Ok(())
        });
        if let Err(store_err) = marked {
            tracing::error!(pr = %pr, error = %store_err, "failed to mark sync as errored");
        }
    }
}

/// Human-readable tracker comment for a failed invocation.
fn failure_comment(
    config: &downport_core::config::SyncConfig,
    pr: PrNumber,
    err: &EngineError,
) -> String {
    let upstream = &config.upstream.name;
    match err {
        EngineError::Fetch { what, detail } => format!(
            "Downstreaming from {upstream} failed because obtaining {what} failed:\n{detail}"
        ),
        EngineError::Workspace {
            repository,
            branch,
            detail,
        } => format!(
            "Downstreaming PR {pr} failed because the {repository} workspace {branch} \
             could not be set up:\n{detail}"
        ),
        EngineError::PatchRender { commit, detail } => format!(
            "Downstreaming from {upstream} failed because creating a patch from {commit} \
             failed:\n{detail}"
        ),
        EngineError::PatchApply { commit, detail } => format!(
            "Downstreaming from {upstream} failed because applying the patch from {commit} \
             failed:\n{detail}"
        ),
        EngineError::MetadataRegen(detail) => format!(
            "Downstreaming PR {pr} failed while updating the test manifest:\n{detail}"
        ),
        other => format!("Downstreaming PR {pr} failed:\n{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use downport_core::config::SyncConfig;
    use downport_core::types::RevisionId;

    #[test]
    fn failure_comments_name_the_offending_commit() {
        let config = SyncConfig::default();
        let err = EngineError::PatchApply {
            commit: RevisionId::from("deadbeef"),
            detail: "error: patch failed".to_owned(),
        };
        let comment = failure_comment(&config, PrNumber(9), &err);
        assert!(comment.contains("deadbeef"));
        assert!(comment.contains("web-platform-tests"));
        assert!(comment.contains("error: patch failed"));
    }

    #[test]
    fn fetch_failure_comment_names_the_change_request() {
        let config = SyncConfig::default();
        let err = EngineError::Fetch {
            what: "PR 9 from web-platform-tests".to_owned(),
            detail: "connection reset".to_owned(),
        };
        let comment = failure_comment(&config, PrNumber(9), &err);
        assert!(comment.contains("PR 9"));
        assert!(comment.contains("connection reset"));
    }
}
