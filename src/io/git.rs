//! Git adapter for the build loop.
//!
//! The loop stages and commits whatever the current unit of work wrote, so we
//! keep a small, explicit wrapper around `git` subprocess calls. The only
//! operations used are the start-time `status` probe, stage-all, and commit;
//! there is no branching, push, or remote interaction.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

/// Classified result of a commit attempt.
///
/// Both variants are success states: a unit of work that regenerates
/// byte-identical content simply has nothing to commit. Hard failures (git
/// missing, corrupt repository) surface as errors instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was created with the given message.
    Committed(String),
    /// Nothing was staged; no commit was made.
    NoOp,
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Cheap probe: true if the workdir is inside a usable git work tree.
    ///
    /// A spawn failure (git binary missing) is an error; a non-zero `status`
    /// exit simply means "not a repository".
    #[instrument(skip_all)]
    pub fn is_work_tree(&self) -> Result<bool> {
        let output = self.run(&["status", "--porcelain"])?;
        debug!(ok = output.status.success(), "status probe");
        Ok(output.status.success())
    }

    /// Stage all changes (respects .gitignore).
    pub fn add_all(&self) -> Result<()> {
        self.run_checked(&["add", "-A"])?;
        Ok(())
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run(&["diff", "--cached", "--name-only"])?;
        Ok(!String::from_utf8_lossy(&out.stdout).trim().is_empty())
    }

    /// Stage everything, then commit with the given message.
    ///
    /// Returns [`CommitOutcome::NoOp`] when nothing ended up staged, which is
    /// expected whenever a unit of work rewrote files without changing them.
    #[instrument(skip_all)]
    pub fn commit_all(&self, message: &str) -> Result<CommitOutcome> {
        self.add_all()?;
        if !self.has_staged_changes()? {
            debug!("no staged changes, skipping commit");
            return Ok(CommitOutcome::NoOp);
        }
        debug!("committing staged changes");
        self.run_checked(&["commit", "-m", message])?;
        Ok(CommitOutcome::Committed(message.to_string()))
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRepo;

    #[test]
    fn probe_rejects_plain_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let git = Git::new(temp.path());
        assert!(!git.is_work_tree().expect("probe"));
    }

    #[test]
    fn probe_accepts_initialized_repo() {
        let repo = TestRepo::new().expect("repo");
        let git = Git::new(repo.root());
        assert!(git.is_work_tree().expect("probe"));
    }

    #[test]
    fn commit_all_commits_new_file() {
        let repo = TestRepo::new().expect("repo");
        std::fs::write(repo.root().join("hello.txt"), "hi\n").expect("write");

        let git = Git::new(repo.root());
        let outcome = git.commit_all("Add hello").expect("commit");
        assert_eq!(outcome, CommitOutcome::Committed("Add hello".to_string()));
    }

    #[test]
    fn commit_all_without_changes_is_noop() {
        let repo = TestRepo::new().expect("repo");
        let git = Git::new(repo.root());
        let outcome = git.commit_all("Nothing here").expect("commit");
        assert_eq!(outcome, CommitOutcome::NoOp);
    }

    #[test]
    fn rewriting_identical_content_is_noop() {
        let repo = TestRepo::new().expect("repo");
        let path = repo.root().join("same.txt");
        std::fs::write(&path, "stable\n").expect("write");

        let git = Git::new(repo.root());
        assert!(matches!(
            git.commit_all("Add same").expect("commit"),
            CommitOutcome::Committed(_)
        ));

        // Rewrite the same bytes; git sees no change.
        std::fs::write(&path, "stable\n").expect("rewrite");
        assert_eq!(git.commit_all("Again").expect("commit"), CommitOutcome::NoOp);
    }
}
