//! Filesystem helpers for writing generated project files.
//!
//! Steps and maintenance actions only touch the working tree through these
//! helpers: unconditional local writes relative to the project root, creating
//! parent directories as needed. No network, no interactive input.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

/// Write `contents` to `rel` under `root`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) -> Result<()> {
    let full = root.join(rel);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(&full, contents).with_context(|| format!("write {}", full.display()))
}

/// Append `contents` to `rel` under `root`, creating the file if missing.
pub fn append_file(root: &Path, rel: &str, contents: &str) -> Result<()> {
    let full = root.join(rel);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&full)
        .with_context(|| format!("open {}", full.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("append {}", full.display()))
}

/// Rewrite the `"version"` field of `package.json` to `1.0.<version>`.
///
/// Returns false when the manifest does not exist yet (early maintenance on a
/// partially built project). The manifest's schema is owned by the generated
/// project, so only the version field is touched.
pub fn bump_manifest_version(root: &Path, version: u64) -> Result<bool> {
    let manifest = root.join("package.json");
    if !manifest.exists() {
        return Ok(false);
    }
    let contents =
        fs::read_to_string(&manifest).with_context(|| format!("read {}", manifest.display()))?;
    let re = Regex::new(r#""version"\s*:\s*"[^"]*""#).context("compile version regex")?;
    let updated = re.replace(&contents, format!(r#""version": "1.0.{version}""#));
    fs::write(&manifest, updated.as_bytes())
        .with_context(|| format!("write {}", manifest.display()))?;
    Ok(true)
}
