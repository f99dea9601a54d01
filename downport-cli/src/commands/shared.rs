//! Collaborator wiring shared by the subcommands.

use downport_core::config::SyncConfig;
use downport_core::store::SyncStore;
use downport_vcs::{GitRepo, RepoTools};

/// The real collaborators, built from configuration.
pub struct Collaborators {
    pub store: SyncStore,
    pub upstream: GitRepo,
    pub downstream: GitRepo,
    pub build: RepoTools,
}

pub fn collaborators(config: &SyncConfig) -> Collaborators {
    Collaborators {
        store: SyncStore::open(&config.paths.store),
        upstream: GitRepo::new(
            config.upstream.name.clone(),
            &config.upstream.path,
            &config.paths.workspaces,
        ),
        downstream: GitRepo::new(
            config.downstream.name.clone(),
            &config.downstream.path,
            &config.paths.workspaces,
        ),
        build: RepoTools::new(),
    }
}
