//! Build-tool wrapper: the `mach` and `wpt` executables that live inside the
//! checkouts.
//!
//! Which binary serves which query mirrors the deployment: `wpt` answers
//! questions about the upstream checkout (files changed, affected tests),
//! `mach` operates on the target tree (manifest regeneration, per-path
//! classification).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use downport_core::capabilities::{BuildTool, CapabilityError};

use crate::cmd;

/// Runs repo-local tool executables in the workdir handed to each call.
#[derive(Debug, Clone)]
pub struct RepoTools {
    mach: String,
    wpt: String,
}

impl RepoTools {
    pub fn new() -> Self {
        Self {
            mach: "./mach".to_owned(),
            wpt: "./wpt".to_owned(),
        }
    }

    /// Override the executable names; used by tests and unusual layouts.
    pub fn with_programs(mach: impl Into<String>, wpt: impl Into<String>) -> Self {
        Self {
            mach: mach.into(),
            wpt: wpt.into(),
        }
    }
}

impl Default for RepoTools {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildTool for RepoTools {
    fn regenerate_manifest(&self, workdir: &Path) -> Result<(), CapabilityError> {
        cmd::run_checked(&self.mach, &["wpt-manifest-update"], workdir)?;
        Ok(())
    }

    fn files_changed(&self, workdir: &Path) -> Result<BTreeSet<String>, CapabilityError> {
        let stdout = cmd::run_checked(&self.wpt, &["files-changed"], workdir)?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    fn classify_paths(
        &self,
        workdir: &Path,
        paths: &[PathBuf],
    ) -> Result<String, CapabilityError> {
        let mut args = vec!["file-info", "bugzilla-component"];
        let rendered: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        args.extend(rendered.iter().map(String::as_str));
        cmd::run_checked(&self.mach, &args, workdir)
    }

    fn tests_affected(
        &self,
        workdir: &Path,
        revish: Option<&str>,
    ) -> Result<String, CapabilityError> {
        // The manifest must be current before the affected-test query.
        cmd::run_checked(&self.wpt, &["manifest"], workdir)?;
        let mut args = vec!["tests-affected", "--show-type", "--new"];
        if let Some(revish) = revish {
            args.push(revish);
        }
        cmd::run_checked(&self.wpt, &args, workdir)
    }
}
