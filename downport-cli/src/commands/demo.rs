//! `downport demo` — replay the end-to-end scenario against throwaway
//! repositories.
//!
//! Builds an upstream remote carrying change request #9 ("Test PR"), a
//! downstream remote, and fresh clones of both, then drives the engine
//! through intake, a pending CI status event, and the idempotent second
//! event. Everything lives in a temp directory that is removed on exit.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use downport_core::capabilities::{BuildTool, CapabilityError};
use downport_core::config::SyncConfig;
use downport_core::events::{ChangeRequestEvent, StatusEvent, StatusState};
use downport_core::store::SyncStore;
use downport_core::types::{PrNumber, RepoName};
use downport_sync::{Engine, StatusReaction};
use downport_vcs::GitRepo;

use crate::tracker::ConsoleTracker;

/// Arguments for `downport demo`.
#[derive(Args, Debug)]
pub struct DemoArgs {}

/// Build tool stand-in for the demo: manifest regeneration is a no-op and
/// the changed-file query reports nothing, so routing takes the default.
struct DemoBuildTool;

impl BuildTool for DemoBuildTool {
    fn regenerate_manifest(&self, _workdir: &Path) -> Result<(), CapabilityError> {
        Ok(())
    }
    fn files_changed(&self, _workdir: &Path) -> Result<BTreeSet<String>, CapabilityError> {
        Ok(BTreeSet::new())
    }
    fn classify_paths(
        &self,
        _workdir: &Path,
        _paths: &[PathBuf],
    ) -> Result<String, CapabilityError> {
        Ok(String::new())
    }
    fn tests_affected(
        &self,
        _workdir: &Path,
        _revish: Option<&str>,
    ) -> Result<String, CapabilityError> {
        Ok(String::new())
    }
}

impl DemoArgs {
    pub fn run(self) -> Result<()> {
        if Command::new("git").arg("--version").output().is_err() {
            bail!("the demo needs a `git` binary on PATH");
        }

        let root = tempfile::TempDir::new().context("failed to create demo directory")?;
        println!("demo sandbox: {}", root.path().display());

        // Upstream remote: master plus change request #9 at refs/pull/9/head.
        let upstream_remote = root.path().join("upstream-remote");
        git(&upstream_remote, &["init", "-q"])?;
        configure_identity(&upstream_remote)?;
        std::fs::write(upstream_remote.join("README.md"), "upstream test suite\n")?;
        git(&upstream_remote, &["add", "README.md"])?;
        git(&upstream_remote, &["commit", "-q", "-m", "initial"])?;
        git(&upstream_remote, &["branch", "-M", "master"])?;
        std::fs::write(
            upstream_remote.join("demo-test.html"),
            "<!doctype html><title>demo</title>\n",
        )?;
        git(&upstream_remote, &["add", "demo-test.html"])?;
        git(&upstream_remote, &["commit", "-q", "-m", "Add demo-test.html"])?;
        let pr_head = git_output(&upstream_remote, &["rev-parse", "HEAD"])?;
        git(
            &upstream_remote,
            &["update-ref", "refs/pull/9/head", pr_head.as_str()],
        )?;
        git(&upstream_remote, &["reset", "-q", "--hard", "HEAD~"])?;

        // Downstream remote: a tree whose integration branch is `central`.
        let downstream_remote = root.path().join("downstream-remote");
        git(&downstream_remote, &["init", "-q"])?;
        configure_identity(&downstream_remote)?;
        std::fs::create_dir_all(downstream_remote.join("testing/web-platform/tests"))?;
        std::fs::write(
            downstream_remote.join("testing/web-platform/tests/README.md"),
            "vendored suite\n",
        )?;
        git(&downstream_remote, &["add", "."])?;
        git(&downstream_remote, &["commit", "-q", "-m", "initial"])?;
        git(&downstream_remote, &["branch", "-M", "central"])?;

        // Fresh clones, remote names matching the configuration.
        let upstream_clone = root.path().join("web-platform-tests");
        clone(&upstream_remote, &upstream_clone, "origin")?;
        let downstream_clone = root.path().join("gecko");
        clone(&downstream_remote, &downstream_clone, "mozilla")?;

        let mut config = SyncConfig::default();
        config.upstream.path = upstream_clone.clone();
        config.downstream.path = downstream_clone.clone();
        config.downstream.baseline_ref = "mozilla/central".to_owned();
        config.paths.workspaces = root.path().join("workspaces");
        config.paths.store = root.path().join("state.json");

        let store = SyncStore::open(&config.paths.store);
        let upstream = GitRepo::new(
            RepoName::from("web-platform-tests"),
            &upstream_clone,
            &config.paths.workspaces,
        );
        let downstream = GitRepo::new(
            RepoName::from("gecko"),
            &downstream_clone,
            &config.paths.workspaces,
        );
        let build = DemoBuildTool;
        let tracker = ConsoleTracker::default();
        let engine = Engine {
            config: &config,
            store: &store,
            upstream: &upstream,
            downstream: &downstream,
            build: &build,
            tracker: &tracker,
        };

        // 1. A new change request arrives.
        println!("\n{}", "-- change request #9 opened --".bold());
        let intake_event = ChangeRequestEvent {
            change_request_id: PrNumber(9),
            title: "Test PR".to_owned(),
            body: "blah blah body".to_owned(),
        };
        let sync = engine.new_change_request(&intake_event)?;
        println!("sync created: PR {} -> {}", sync.pr, sync.issue);

        // 2. CI reports pending for the head revision; the workspace is
        //    stale, so the full pipeline runs.
        println!("\n{}", "-- pending CI status --".bold());
        let status_event = StatusEvent {
            context: config.ci.context.clone(),
            state: StatusState::Pending,
            sha: pr_head.clone(),
        };
        match engine.on_status(PrNumber(9), &status_event)? {
            StatusReaction::Synced(summary) => println!(
                "synced: {} ported, {} skipped, routed to {}",
                summary.ported, summary.skipped_empty, summary.routing
            ),
            other => bail!("expected a sync run, got {other:?}"),
        }

        // 3. The same event again must do nothing.
        println!("\n{}", "-- identical status again --".bold());
        match engine.on_status(PrNumber(9), &status_event)? {
            StatusReaction::AlreadyAtRevision => println!("no-op: workspace already current"),
            other => bail!("expected a no-op, got {other:?}"),
        }

        println!("\n{} demo finished", "✓".green());
        Ok(())
    }
}

fn git(dir: &Path, args: &[&str]) -> Result<()> {
    git_output(dir, args).map(|_| ())
}

fn git_output(dir: &Path, args: &[&str]) -> Result<String> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .context("failed to run git")?;
    if !output.status.success() {
        bail!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

fn configure_identity(dir: &Path) -> Result<()> {
    git(dir, &["config", "user.email", "downport@example.com"])?;
    git(dir, &["config", "user.name", "downport demo"])
}

fn clone(remote: &Path, target: &Path, origin_name: &str) -> Result<()> {
    let parent = target.parent().context("clone target has no parent")?;
    let remote_path = remote.to_string_lossy().into_owned();
    let target_path = target.to_string_lossy().into_owned();
    let output = Command::new("git")
        .args([
            "clone",
            "-q",
            "-o",
            origin_name,
            remote_path.as_str(),
            target_path.as_str(),
        ])
        .current_dir(parent)
        .output()
        .context("failed to run git clone")?;
    if !output.status.success() {
        bail!(
            "git clone failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    configure_identity(target)
}
