//! `git`-CLI implementation of the version-control capabilities.
//!
//! One [`GitRepo`] wraps a long-lived clone; sync worktrees are created under
//! `<workspaces>/<repo-name>/<branch>` so every sync mutates its own checkout
//! and the clone itself stays pristine.

use std::path::{Path, PathBuf};

use downport_core::capabilities::{CapabilityError, CommandOutput, Vcs, VcsWorkspace};
use downport_core::types::{BranchName, RepoName, RevisionId};

use crate::cmd;

/// A git clone plus the directory its sync worktrees live under.
#[derive(Debug, Clone)]
pub struct GitRepo {
    name: RepoName,
    root: PathBuf,
    worktrees: PathBuf,
}

impl GitRepo {
    /// `root` is the clone; worktrees land under `workspaces_root/<name>/`.
    pub fn new(name: RepoName, root: impl Into<PathBuf>, workspaces_root: &Path) -> Self {
        let worktrees = workspaces_root.join(&name.0);
        Self {
            name,
            root: root.into(),
            worktrees,
        }
    }

    pub fn name(&self) -> &RepoName {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn worktree_path(&self, branch: &BranchName) -> PathBuf {
        self.worktrees.join(&branch.0)
    }

    fn git(&self, args: &[&str]) -> Result<String, CapabilityError> {
        cmd::run_checked("git", args, &self.root)
    }
}

impl Vcs for GitRepo {
    fn fetch(
        &self,
        remote: &str,
        refspec: Option<&str>,
        tags: bool,
    ) -> Result<(), CapabilityError> {
        let mut args = vec!["fetch"];
        if !tags {
            args.push("--no-tags");
        }
        args.push(remote);
        if let Some(refspec) = refspec {
            args.push(refspec);
        }
        tracing::info!(repo = %self.name, remote, refspec = refspec.unwrap_or("<all>"), "fetching");
        self.git(&args)?;
        Ok(())
    }

    fn branch_tip(&self, branch: &BranchName) -> Result<Option<RevisionId>, CapabilityError> {
        let refname = format!("refs/heads/{branch}");
        let output = cmd::run("git", &["rev-parse", "--verify", "--quiet", &refname], &self.root)?;
        if !output.success() {
            return Ok(None);
        }
        Ok(Some(RevisionId::from(output.stdout.trim().to_owned())))
    }

    fn ensure_worktree(
        &self,
        branch: &BranchName,
        baseline: &str,
    ) -> Result<Box<dyn VcsWorkspace>, CapabilityError> {
        let path = self.worktree_path(branch);
        if path.exists() {
            tracing::debug!(repo = %self.name, branch = %branch, "reusing existing worktree");
            return Ok(Box::new(GitWorktree {
                branch: branch.clone(),
                root: path,
            }));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CapabilityError::Spawn {
                program: format!("mkdir {}", parent.display()),
                source,
            })?;
        }

        let path_str = path.to_string_lossy().into_owned();
        if self.branch_tip(branch)?.is_some() {
            // Branch survived a previous worktree; drop any stale worktree
            // registration, then reattach rather than fork.
            self.git(&["worktree", "prune"])?;
            self.git(&["worktree", "add", &path_str, &branch.0])?;
        } else {
            self.git(&["worktree", "add", "-b", &branch.0, &path_str, baseline])?;
        }
        tracing::info!(repo = %self.name, branch = %branch, path = %path.display(), "created worktree");

        Ok(Box::new(GitWorktree {
            branch: branch.clone(),
            root: path,
        }))
    }

    fn remove_worktree(&self, branch: &BranchName) -> Result<(), CapabilityError> {
        let path = self.worktree_path(branch);
        if path.exists() {
            let path_str = path.to_string_lossy().into_owned();
            self.git(&["worktree", "remove", "--force", &path_str])?;
            tracing::info!(repo = %self.name, branch = %branch, "removed worktree");
        }
        if self.branch_tip(branch)?.is_some() {
            self.git(&["branch", "-D", &branch.0])?;
        }
        Ok(())
    }
}

/// One mutable checkout bound to a sync branch.
#[derive(Debug, Clone)]
pub struct GitWorktree {
    branch: BranchName,
    root: PathBuf,
}

impl GitWorktree {
    fn git(&self, args: &[&str]) -> Result<String, CapabilityError> {
        cmd::run_checked("git", args, &self.root)
    }
}

impl VcsWorkspace for GitWorktree {
    fn root(&self) -> &Path {
        &self.root
    }

    fn branch(&self) -> &BranchName {
        &self.branch
    }

    fn current_tip(&self) -> Result<RevisionId, CapabilityError> {
        let stdout = self.git(&["rev-parse", "HEAD"])?;
        Ok(RevisionId::from(stdout.trim().to_owned()))
    }

    fn fetch(
        &self,
        remote: &str,
        refspec: Option<&str>,
        tags: bool,
    ) -> Result<(), CapabilityError> {
        let mut args = vec!["fetch"];
        if !tags {
            args.push("--no-tags");
        }
        args.push(remote);
        if let Some(refspec) = refspec {
            args.push(refspec);
        }
        self.git(&args)?;
        Ok(())
    }

    fn merge(&self, rev: &str) -> Result<(), CapabilityError> {
        self.git(&["merge", rev])?;
        Ok(())
    }

    fn reset_hard(&self, rev: &str) -> Result<(), CapabilityError> {
        self.git(&["reset", "--hard", rev])?;
        Ok(())
    }

    fn commits_between(&self, base: &str) -> Result<Vec<RevisionId>, CapabilityError> {
        let range = format!("{base}..HEAD");
        let stdout = self.git(&["rev-list", "--reverse", &range])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(RevisionId::from)
            .collect())
    }

    fn render_patch(&self, commit: &RevisionId) -> Result<String, CapabilityError> {
        let mut patch = self.git(&["show", "--pretty=email", &commit.0])?;
        patch.push('\n');
        Ok(patch)
    }

    fn apply_patch(
        &self,
        patch: &str,
        dir_prefix: &Path,
    ) -> Result<CommandOutput, CapabilityError> {
        let directory = format!("--directory={}", dir_prefix.to_string_lossy());
        cmd::run_with_stdin("git", &["am", &directory, "-"], &self.root, patch)
    }

    fn is_dirty(&self) -> Result<bool, CapabilityError> {
        let stdout = self.git(&["status", "--porcelain"])?;
        Ok(!stdout.trim().is_empty())
    }

    fn add(&self, path: &Path) -> Result<(), CapabilityError> {
        let path_str = path.to_string_lossy().into_owned();
        self.git(&["add", &path_str])?;
        Ok(())
    }

    fn commit(&self, message: &str, allow_empty: bool) -> Result<(), CapabilityError> {
        let mut args = vec!["commit", "-m", message];
        if allow_empty {
            args.push("--allow-empty");
        }
        self.git(&args)?;
        Ok(())
    }

    fn push(&self, remote: &str) -> Result<CommandOutput, CapabilityError> {
        cmd::run("git", &["push", remote], &self.root)
    }
}

// ---------------------------------------------------------------------------
// Tests (need a real `git`; skipped when none is installed)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .is_ok()
    }

    fn sh_git(dir: &Path, args: &[&str]) -> String {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Fresh repo with one commit; returns (dir, initial sha).
    fn seed_repo() -> (TempDir, String) {
        let dir = TempDir::new().expect("tempdir");
        sh_git(dir.path(), &["init", "-q"]);
        sh_git(dir.path(), &["config", "user.email", "sync@example.com"]);
        sh_git(dir.path(), &["config", "user.name", "Sync Test"]);
        fs::write(dir.path().join("README.md"), "seed\n").expect("write");
        sh_git(dir.path(), &["add", "README.md"]);
        sh_git(dir.path(), &["commit", "-q", "-m", "initial"]);
        let sha = sh_git(dir.path(), &["rev-parse", "HEAD"]).trim().to_owned();
        (dir, sha)
    }

    fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> String {
        fs::write(dir.join(name), content).expect("write");
        sh_git(dir, &["add", name]);
        sh_git(dir, &["commit", "-q", "-m", message]);
        sh_git(dir, &["rev-parse", "HEAD"]).trim().to_owned()
    }

    #[test]
    fn ensure_worktree_is_idempotent() {
        if !git_available() {
            eprintln!("skipping: git not found");
            return;
        }
        let (repo_dir, sha) = seed_repo();
        let workspaces = TempDir::new().expect("workspaces");
        let repo = GitRepo::new(RepoName::from("suite"), repo_dir.path(), workspaces.path());

        let branch = BranchName::from("PR_7");
        let first = repo.ensure_worktree(&branch, &sha).expect("first ensure");
        let second = repo.ensure_worktree(&branch, &sha).expect("second ensure");
        assert_eq!(first.root(), second.root(), "same workspace both times");
        assert_eq!(first.current_tip().expect("tip"), RevisionId::from(sha.as_str()));
    }

    #[test]
    fn branch_tip_tracks_worktree_commits() {
        if !git_available() {
            eprintln!("skipping: git not found");
            return;
        }
        let (repo_dir, sha) = seed_repo();
        let workspaces = TempDir::new().expect("workspaces");
        let repo = GitRepo::new(RepoName::from("suite"), repo_dir.path(), workspaces.path());
        let branch = BranchName::from("PR_3");

        assert!(repo.branch_tip(&branch).expect("tip").is_none());

        let work = repo.ensure_worktree(&branch, &sha).expect("ensure");
        let new_sha = commit_file(work.root(), "a.txt", "a\n", "add a");
        assert_eq!(
            repo.branch_tip(&branch).expect("tip"),
            Some(RevisionId::from(new_sha.as_str()))
        );
    }

    #[test]
    fn commits_between_is_oldest_first() {
        if !git_available() {
            eprintln!("skipping: git not found");
            return;
        }
        let (repo_dir, base) = seed_repo();
        let workspaces = TempDir::new().expect("workspaces");
        let repo = GitRepo::new(RepoName::from("suite"), repo_dir.path(), workspaces.path());

        let work = repo
            .ensure_worktree(&BranchName::from("PR_5"), &base)
            .expect("ensure");
        let c1 = commit_file(work.root(), "one.txt", "1\n", "first");
        let c2 = commit_file(work.root(), "two.txt", "2\n", "second");

        let commits = work.commits_between(&base).expect("rev-list");
        assert_eq!(
            commits,
            vec![RevisionId::from(c1.as_str()), RevisionId::from(c2.as_str())]
        );
    }

    #[test]
    fn render_and_apply_patch_under_prefix() {
        if !git_available() {
            eprintln!("skipping: git not found");
            return;
        }
        let (source_dir, source_base) = seed_repo();
        let (target_dir, target_base) = seed_repo();
        let workspaces = TempDir::new().expect("workspaces");

        let source = GitRepo::new(RepoName::from("suite"), source_dir.path(), workspaces.path());
        let target = GitRepo::new(RepoName::from("tree"), target_dir.path(), workspaces.path());

        let source_work = source
            .ensure_worktree(&BranchName::from("PR_9"), &source_base)
            .expect("source worktree");
        let sha = commit_file(
            source_work.root(),
            "test.html",
            "<html></html>\n",
            "Add test",
        );

        let patch = source_work
            .render_patch(&RevisionId::from(sha.as_str()))
            .expect("render");
        assert!(patch.contains("Subject:"), "email metadata present");
        assert!(patch.contains("diff --git"), "content change present");

        let target_work = target
            .ensure_worktree(&BranchName::from("PR_9"), &target_base)
            .expect("target worktree");
        let outcome = target_work
            .apply_patch(&patch, Path::new("suite/tests"))
            .expect("am runs");
        assert!(outcome.success(), "apply failed: {}", outcome.stderr);
        assert!(
            target_work.root().join("suite/tests/test.html").exists(),
            "patch paths rebased under the prefix"
        );
    }

    #[test]
    fn remove_worktree_tears_down_checkout_and_branch() {
        if !git_available() {
            eprintln!("skipping: git not found");
            return;
        }
        let (repo_dir, sha) = seed_repo();
        let workspaces = TempDir::new().expect("workspaces");
        let repo = GitRepo::new(RepoName::from("suite"), repo_dir.path(), workspaces.path());
        let branch = BranchName::from("PR_11");

        let work = repo.ensure_worktree(&branch, &sha).expect("ensure");
        let root = work.root().to_path_buf();
        assert!(root.exists());

        repo.remove_worktree(&branch).expect("remove");
        assert!(!root.exists(), "worktree directory removed");
        assert!(repo.branch_tip(&branch).expect("tip").is_none());

        // Removing again is not an error.
        repo.remove_worktree(&branch).expect("second remove");
    }

    #[test]
    fn dirty_detection_and_reset() {
        if !git_available() {
            eprintln!("skipping: git not found");
            return;
        }
        let (repo_dir, sha) = seed_repo();
        let workspaces = TempDir::new().expect("workspaces");
        let repo = GitRepo::new(RepoName::from("suite"), repo_dir.path(), workspaces.path());

        let work = repo
            .ensure_worktree(&BranchName::from("PR_13"), &sha)
            .expect("ensure");
        assert!(!work.is_dirty().expect("clean at baseline"));

        fs::write(work.root().join("README.md"), "scribble\n").expect("write");
        assert!(work.is_dirty().expect("dirty after edit"));

        work.reset_hard(&sha).expect("reset");
        assert!(!work.is_dirty().expect("clean after reset"));
        assert_eq!(work.current_tip().expect("tip"), RevisionId::from(sha.as_str()));
    }
}
