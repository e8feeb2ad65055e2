//! Product event log appended under `.siteforge/builder.log`.
//!
//! This is the durable counterpart to the tool's live log output: one
//! timestamped line per notable loop event. Unlike tracing, it is always
//! written and survives restarts.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line.
    pub fn append(&self, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let line = format!("[{}] {message}\n", Local::now().format("%Y-%m-%d %H:%M:%S"));
        file.write_all(line.as_bytes())
            .with_context(|| format!("append {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_accumulates_timestamped_lines() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = EventLog::new(temp.path().join("builder.log"));
        log.append("started").expect("append");
        log.append("committed: Add feed module").expect("append");

        let contents = fs::read_to_string(log.path()).expect("read");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("started"));
        assert!(lines[1].contains("committed: Add feed module"));
        assert!(lines[0].starts_with('['));
    }
}
