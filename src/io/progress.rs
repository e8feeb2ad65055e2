//! Progress persistence: the single durable counter driving the loop.
//!
//! The file holds one decimal integer (the count of completed units of work)
//! and nothing else, so it stays human-inspectable and can be deleted to
//! reset the build from scratch. Loading is deliberately lenient: a missing
//! or unparsable file counts as zero, never an error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Durable store for the progress counter.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted counter. Missing or corrupt contents recover to 0.
    pub fn load(&self) -> u64 {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %self.path.display(), err = %err, "no progress file, starting at 0");
                return 0;
            }
        };
        match contents.trim().parse::<u64>() {
            Ok(progress) => {
                debug!(progress, "progress loaded");
                progress
            }
            Err(_) => {
                warn!(path = %self.path.display(), "corrupt progress file, recovering to 0");
                0
            }
        }
    }

    /// Atomically persist the counter (temp file + rename).
    ///
    /// The next scheduling decision depends on this value, so the write must
    /// complete (or fail loudly) before the loop proceeds.
    pub fn save(&self, progress: u64) -> Result<()> {
        debug!(path = %self.path.display(), progress, "writing progress");
        let parent = self
            .path
            .parent()
            .with_context(|| format!("progress path missing parent {}", self.path.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, format!("{progress}\n"))
            .with_context(|| format!("write temp progress {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("replace progress {}", self.path.display()))?;
        Ok(())
    }

    /// Delete the progress file, resetting the build to step 0.
    pub fn reset(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("remove progress {}", self.path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ProgressStore::new(temp.path().join("progress"));
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn corrupt_contents_recover_to_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("progress");
        fs::write(&path, "not a number").expect("write");
        assert_eq!(ProgressStore::new(&path).load(), 0);
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ProgressStore::new(temp.path().join("progress"));
        store.save(17).expect("save");
        assert_eq!(store.load(), 17);
    }

    #[test]
    fn save_overwrites_previous_value() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ProgressStore::new(temp.path().join("progress"));
        store.save(3).expect("save");
        store.save(4).expect("save");
        assert_eq!(store.load(), 4);
    }

    #[test]
    fn file_is_plain_text_with_trailing_newline() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ProgressStore::new(temp.path().join("progress"));
        store.save(6).expect("save");
        let contents = fs::read_to_string(store.path()).expect("read");
        assert_eq!(contents, "6\n");
    }

    #[test]
    fn reset_removes_the_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = ProgressStore::new(temp.path().join("progress"));
        store.save(2).expect("save");
        store.reset().expect("reset");
        assert_eq!(store.load(), 0);
        // Resetting again is fine.
        store.reset().expect("reset");
    }
}
