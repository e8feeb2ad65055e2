//! Test-only helpers for exercising the loop against a real git repository.

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

/// Temporary git repository with identity configured and an initial commit.
pub struct TestRepo {
    temp: TempDir,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        run_git(temp.path(), &["init", "-q"])?;
        run_git(temp.path(), &["config", "user.name", "siteforge-test"])?;
        run_git(temp.path(), &["config", "user.email", "test@siteforge.invalid"])?;
        fs::write(temp.path().join(".keep"), "").context("write .keep")?;
        run_git(temp.path(), &["add", "-A"])?;
        run_git(temp.path(), &["commit", "-q", "-m", "init"])?;
        Ok(Self { temp })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Number of commits on HEAD.
    pub fn commit_count(&self) -> Result<usize> {
        let output = Command::new("git")
            .args(["rev-list", "--count", "HEAD"])
            .current_dir(self.temp.path())
            .output()
            .context("spawn git rev-list")?;
        if !output.status.success() {
            return Err(anyhow!("git rev-list failed"));
        }
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .context("parse commit count")
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<()> {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !status.success() {
        return Err(anyhow!("git {} failed", args.join(" ")));
    }
    Ok(())
}
