//! Sync configuration.
//!
//! One `SyncConfig` value is loaded at startup and passed into each component
//! explicitly; nothing reads configuration from process-global state.
//! Partial YAML files are fine: every field has a default matching the
//! web-platform-tests → gecko deployment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{RepoName, RoutingDecision};

/// Top-level configuration for one sync deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    pub upstream: UpstreamConfig,
    pub downstream: DownstreamConfig,
    pub ci: CiConfig,
    pub routing: RoutingConfig,
    pub paths: PathsConfig,
}

/// The upstream test-suite repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub name: RepoName,
    /// Location of the long-lived clone.
    pub path: PathBuf,
    pub remote: String,
    /// Branch fetched from the remote.
    pub branch: String,
    /// Last-known-integrated baseline; new commits are diffed against this.
    pub baseline_ref: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            name: RepoName::from("web-platform-tests"),
            path: PathBuf::from("repos/web-platform-tests"),
            remote: "origin".to_owned(),
            branch: "master".to_owned(),
            baseline_ref: "origin/master".to_owned(),
        }
    }
}

/// The downstream target tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownstreamConfig {
    pub name: RepoName,
    /// Location of the long-lived clone.
    pub path: PathBuf,
    pub remote: String,
    pub baseline_ref: String,
    /// Subdirectory prefix the upstream project lives under in the target
    /// tree; all translated patches are rebased onto it.
    pub test_root: PathBuf,
    /// Directory holding generated manifest/metadata files.
    pub meta_root: PathBuf,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            name: RepoName::from("gecko"),
            path: PathBuf::from("repos/gecko"),
            remote: "mozilla".to_owned(),
            baseline_ref: "mozilla/central".to_owned(),
            test_root: PathBuf::from("testing/web-platform/tests"),
            meta_root: PathBuf::from("testing/web-platform/meta"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiConfig {
    /// The single status context the reactor acts on.
    pub context: String,
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            context: "continuous-integration/travis-ci/pr".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub default_product: String,
    pub default_component: String,
}

impl RoutingConfig {
    pub fn default_decision(&self) -> RoutingDecision {
        RoutingDecision::new(&self.default_product, &self.default_component)
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_product: "Testing".to_owned(),
            default_component: "web-platform-tests".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root directory worktrees are created under.
    pub workspaces: PathBuf,
    /// Location of the state-store JSON file.
    pub store: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            workspaces: PathBuf::from("workspaces"),
            store: PathBuf::from("downport-state.json"),
        }
    }
}

/// Load configuration from a YAML file.
pub fn load_at(path: &Path) -> Result<SyncConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_deployment() {
        let config = SyncConfig::default();
        assert_eq!(config.upstream.name, RepoName::from("web-platform-tests"));
        assert_eq!(config.downstream.remote, "mozilla");
        assert_eq!(
            config.downstream.test_root,
            PathBuf::from("testing/web-platform/tests")
        );
        assert_eq!(
            config.routing.default_decision(),
            RoutingDecision::new("Testing", "web-platform-tests")
        );
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "ci:\n  context: ci/custom\npaths:\n  workspaces: /var/sync/work\n",
        )
        .expect("write config");

        let config = load_at(&path).expect("load");
        assert_eq!(config.ci.context, "ci/custom");
        assert_eq!(config.paths.workspaces, PathBuf::from("/var/sync/work"));
        // Everything unspecified falls back to defaults.
        assert_eq!(config.upstream.remote, "origin");
        assert_eq!(config.routing.default_component, "web-platform-tests");
    }

    #[test]
    fn roundtrip_through_yaml() {
        let config = SyncConfig::default();
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let back: SyncConfig = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back, config);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nope.yaml");
        let err = load_at(&path).expect_err("should fail");
        assert!(err.to_string().contains("nope.yaml"));
    }
}
