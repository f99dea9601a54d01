//! Durable sync state store.
//!
//! # Storage layout
//!
//! A single JSON document (`StoreState`) holding every repository and sync
//! record, written with the atomic `.tmp` + rename protocol. A sibling
//! `.lock` file serializes writers: all orchestrator work for one invocation
//! runs inside one [`SyncStore::with_transaction`] scope, so a crash
//! mid-invocation leaves either the pre-invocation document or the fully
//! updated one, never a half-written record.
//!
//! Concurrent invocations for the same sync contend on the lock; the loser
//! blocks until the winner's commit, then observes the updated state (and
//! usually becomes a no-op via the status reactor's tip check).

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::types::{PrNumber, RepoName, Repository, SyncDirection, SyncRecord};

/// How long a transaction waits for the lock before giving up.
const LOCK_WAIT: Duration = Duration::from_secs(30);
const LOCK_POLL: Duration = Duration::from_millis(25);

// ---------------------------------------------------------------------------
// State document
// ---------------------------------------------------------------------------

/// The full persisted state: repositories and sync records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StoreState {
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub syncs: Vec<SyncRecord>,
}

impl StoreState {
    pub fn repository(&self, name: &RepoName) -> Option<&Repository> {
        self.repositories.iter().find(|r| &r.name == name)
    }

    /// Get or create the repository record for `name`.
    pub fn ensure_repository(&mut self, name: &RepoName) {
        if self.repository(name).is_none() {
            self.repositories.push(Repository { name: name.clone() });
        }
    }

    pub fn find_sync(
        &self,
        repository: &RepoName,
        pr: PrNumber,
        direction: SyncDirection,
    ) -> Option<&SyncRecord> {
        self.syncs
            .iter()
            .find(|s| &s.repository == repository && s.pr == pr && s.direction == direction)
    }

    pub fn find_sync_mut(
        &mut self,
        repository: &RepoName,
        pr: PrNumber,
        direction: SyncDirection,
    ) -> Option<&mut SyncRecord> {
        self.syncs
            .iter_mut()
            .find(|s| &s.repository == repository && s.pr == pr && s.direction == direction)
    }

    /// Insert a new sync record, enforcing uniqueness on
    /// (repository, pr, direction).
    pub fn insert_sync(&mut self, record: SyncRecord) -> Result<(), StoreError> {
        if self
            .find_sync(&record.repository, record.pr, record.direction)
            .is_some()
        {
            return Err(StoreError::DuplicateSync {
                repository: record.repository,
                pr: record.pr,
            });
        }
        self.syncs.push(record);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Store handle
// ---------------------------------------------------------------------------

/// Handle to the on-disk store. Cheap to construct; all I/O happens per call.
#[derive(Debug, Clone)]
pub struct SyncStore {
    path: PathBuf,
}

impl SyncStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only snapshot of the current state. Returns an empty state when
    /// the file does not exist yet.
    pub fn snapshot(&self) -> Result<StoreState, StoreError> {
        self.load()
    }

    /// Run `f` against a mutable copy of the state and commit atomically on
    /// success. Any error from `f` (or from the commit itself) discards the
    /// copy, leaving the on-disk document untouched.
    pub fn with_transaction<T, E>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let _lock = StoreLock::acquire(self.lock_path(), LOCK_WAIT)?;
        let mut state = self.load()?;
        let value = f(&mut state)?;
        self.save(&state)?;
        Ok(value)
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_owned());
        name.push_str(".lock");
        self.path.with_file_name(name)
    }

    fn load(&self) -> Result<StoreState, StoreError> {
        if !self.path.exists() {
            return Ok(StoreState::default());
        }
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| io_err(&self.path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, state: &StoreState) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lock file
// ---------------------------------------------------------------------------

struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    fn acquire(path: PathBuf, wait: Duration) -> Result<Self, StoreError> {
        let deadline = Instant::now() + wait;
        loop {
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => return Ok(Self { path }),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::LockTimeout { path });
                    }
                    std::thread::sleep(LOCK_POLL);
                }
                Err(err) => return Err(io_err(&path, err)),
            }
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
