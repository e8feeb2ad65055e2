//! Scheduled, resumable site-build loop.
//!
//! siteforge incrementally generates a demo social web app inside a git
//! working tree: one unit of work per scheduling interval, each committed with
//! a human-readable message. A single persisted counter (the progress file)
//! determines the next unit, so the tool can be stopped and restarted at any
//! point without losing its place. Once the finite step registry is exhausted
//! the loop rotates forever through a fixed set of version-stamped
//! maintenance actions.
//!
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (progress-to-unit planning).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, git, progress and
//!   config persistence). Isolated to enable faking in tests.
//!
//! Orchestration modules ([`scheduler`], [`controller`], [`registry`],
//! [`maintenance`]) coordinate core logic with I/O to implement the build
//! loop and its CLI commands.

pub mod controller;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod maintenance;
pub mod registry;
pub mod scheduler;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
