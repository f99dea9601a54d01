//! Domain types for downstream syncing.
//!
//! All identifiers are newtypes; never pass a bare `String` where a revision,
//! branch, or repository name is meant. All types serialize via serde so the
//! state store can persist them as JSON.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a version-control repository (e.g.
/// `web-platform-tests`, `gecko`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoName(pub String);

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Upstream change-request (pull-request) number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for PrNumber {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

/// Name of a branch / worktree owned by a sync.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchName(pub String);

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BranchName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BranchName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A full commit identifier (40-hex for git).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId(pub String);

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RevisionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque reference to a tracker issue, as handed out by the tracker
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueRef(pub u64);

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issue {}", self.0)
    }
}

impl From<u64> for IssueRef {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Direction a sync moves changes in. Only downstream syncing is implemented;
/// the variant exists so the store key matches the full domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    #[default]
    Downstream,
    Upstream,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::Downstream => write!(f, "downstream"),
            SyncDirection::Upstream => write!(f, "upstream"),
        }
    }
}

/// Where a sync currently is in its lifecycle. Persisted so a restarted
/// process can see how far a previous invocation got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPhase {
    #[default]
    PendingIntake,
    FetchingSource,
    Translating,
    UpdatingMetadata,
    Classifying,
    Reported,
    Error,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncPhase::PendingIntake => "pending-intake",
            SyncPhase::FetchingSource => "fetching-source",
            SyncPhase::Translating => "translating",
            SyncPhase::UpdatingMetadata => "updating-metadata",
            SyncPhase::Classifying => "classifying",
            SyncPhase::Reported => "reported",
            SyncPhase::Error => "error",
        };
        f.write_str(label)
    }
}

impl SyncPhase {
    /// `Reported` and `Error` are terminal; everything else may advance.
    pub fn is_terminal(self) -> bool {
        matches!(self, SyncPhase::Reported | SyncPhase::Error)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A named version-control remote/target known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: RepoName,
}

/// The (product, component) routing pair assigned to a tracker issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub product: String,
    pub component: String,
}

impl RoutingDecision {
    pub fn new(product: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            component: component.into(),
        }
    }

    /// Parse a classification label of the form `Product :: Component`.
    ///
    /// Returns `None` for labels that don't carry both halves; callers fall
    /// back to their default in that case.
    pub fn from_label(label: &str) -> Option<Self> {
        let (product, component) = label.split_once(" :: ")?;
        if product.is_empty() || component.is_empty() {
            return None;
        }
        Some(Self::new(product, component))
    }
}

impl fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :: {}", self.product, self.component)
    }
}

/// The durable record of one change-request's downstream porting task.
///
/// Identity is `(repository, pr, direction)`; the store enforces uniqueness
/// on that triple. Workspace branch names start unset and are recorded the
/// first time the workspace manager materializes each checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub pr: PrNumber,
    pub direction: SyncDirection,
    pub repository: RepoName,
    pub issue: IssueRef,
    #[serde(default)]
    pub phase: SyncPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_branch: Option<BranchName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_branch: Option<BranchName>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncRecord {
    pub fn new(pr: PrNumber, repository: RepoName, issue: IssueRef) -> Self {
        let now = Utc::now();
        Self {
            pr,
            direction: SyncDirection::Downstream,
            repository,
            issue,
            phase: SyncPhase::PendingIntake,
            source_branch: None,
            target_branch: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Deterministic branch name derived from the change-request id; used for
    /// the worktree in both repositories.
    pub fn branch_name(&self) -> BranchName {
        BranchName(format!("PR_{}", self.pr))
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
