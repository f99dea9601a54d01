//! Change-request intake: one new sync per incoming change request.
//!
//! The tracker issue and the sync record are created inside the same store
//! transaction. A store failure before the issue request means the issue is
//! never asked for; a failure after it leaves no sync row behind, so there
//! is never a sync without an issue or a half-visible record.

use downport_core::error::StoreError;
use downport_core::events::ChangeRequestEvent;
use downport_core::types::{SyncDirection, SyncRecord};

use crate::error::EngineError;
use crate::Engine;

impl Engine<'_> {
    /// Create the sync (and its tracker issue) for a newly opened change
    /// request. Rejects duplicates per (repository, pr, direction).
    pub fn new_change_request(
        &self,
        event: &ChangeRequestEvent,
    ) -> Result<SyncRecord, EngineError> {
        let pr = event.change_request_id;
        let routing = &self.config.routing;

        self.store.with_transaction(|state| {
            state.ensure_repository(&self.config.upstream.name);
            state.ensure_repository(&self.config.downstream.name);

            if state
                .find_sync(&self.config.upstream.name, pr, SyncDirection::Downstream)
                .is_some()
            {
                // Duplicate detected before the issue request: nothing is
                // created anywhere.
                return Err(EngineError::Store(StoreError::DuplicateSync {
                    repository: self.config.upstream.name.clone(),
                    pr,
                }));
            }

            let summary = format!("[wpt-sync] PR {} - {}", pr, event.title);
            let issue = self
                .tracker
                .create(
                    &summary,
                    &event.body,
                    &routing.default_product,
                    &routing.default_component,
                )
                .map_err(EngineError::Tracker)?;

            let record = SyncRecord::new(pr, self.config.upstream.name.clone(), issue);
            state.insert_sync(record.clone())?;
            tracing::info!(pr = %pr, issue = %record.issue, "created sync for new change request");
            Ok(record)
        })
    }
}
