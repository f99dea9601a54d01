//! Error types for downport-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{PrNumber, RepoName};

/// All errors that can arise from state-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A sync already exists for this (repository, pr, direction) triple.
    #[error("sync for {repository} PR {pr} already exists")]
    DuplicateSync { repository: RepoName, pr: PrNumber },

    /// No sync record matched the lookup.
    #[error("no sync found for PR {pr}")]
    SyncNotFound { pr: PrNumber },

    /// Could not acquire the store lock before the deadline; another
    /// invocation holds it.
    #[error("timed out waiting for store lock at {path}")]
    LockTimeout { path: PathBuf },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Errors from loading the sync configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
