//! Stable exit codes for siteforge CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid config/interval/worktree or other errors.
pub const INVALID: i32 = 1;
