//! # downport-sync
//!
//! The downstream sync engine: takes change-request and CI status events,
//! materializes per-sync workspaces in both repositories, ports upstream
//! commits onto the target tree, and drives the associated tracker issue.
//!
//! All external effects go through the capability traits in
//! `downport_core::capabilities`; the engine itself is collaborator-agnostic
//! and fully testable against in-memory mocks.

pub mod classify;
pub mod error;
pub mod intake;
pub mod orchestrator;
pub mod status;
pub mod translate;
pub mod trypush;
pub mod workspace;

use downport_core::capabilities::{BuildTool, Tracker, Vcs};
use downport_core::config::SyncConfig;
use downport_core::store::SyncStore;

pub use error::EngineError;
pub use orchestrator::SyncSummary;
pub use status::StatusReaction;
pub use translate::TranslationSummary;

/// Everything one sync-processing invocation needs, passed in explicitly.
///
/// Construction is cheap; an `Engine` borrows its collaborators and holds no
/// state of its own, so callers build one per run (or per request) with
/// whatever lifecycle suits them.
pub struct Engine<'a> {
    pub config: &'a SyncConfig,
    pub store: &'a SyncStore,
    /// The upstream test-suite repository.
    pub upstream: &'a dyn Vcs,
    /// The downstream target tree.
    pub downstream: &'a dyn Vcs,
    pub build: &'a dyn BuildTool,
    pub tracker: &'a dyn Tracker,
}
