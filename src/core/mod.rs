//! Pure, deterministic logic with no I/O.

pub mod plan;
