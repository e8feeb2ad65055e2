//! Side-effecting operations (filesystem, git, persisted state).

pub mod config;
pub mod event_log;
pub mod git;
pub mod init;
pub mod progress;
pub mod workspace;
