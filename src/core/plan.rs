//! Pure mapping from the persisted progress counter to the next unit of work.
//!
//! The progress counter alone determines what runs next: values below the
//! registry size select the corresponding finite step, everything above maps
//! onto the cyclic maintenance rotation via modulo arithmetic. Keeping this a
//! pure function is what makes stop/restart resumption trivially correct.

/// Unit of work selected for a given progress value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Finite registry step, identified by its 0-based index.
    Step(usize),
    /// Cyclic maintenance action, entered once the registry is exhausted.
    Maintenance {
        /// Monotonically increasing maintenance version (1-indexed), embedded
        /// into generated artifacts so repeat cycles never produce identical
        /// output.
        version: u64,
        /// Index into the fixed maintenance action set.
        cycle_index: usize,
    },
}

impl Unit {
    /// Short phase label for user-facing messages.
    pub fn phase(&self) -> &'static str {
        match self {
            Unit::Step(_) => "feature step",
            Unit::Maintenance { .. } => "maintenance",
        }
    }
}

/// Map a progress value to the unit of work that must run next.
///
/// `cycle_len` is the number of maintenance actions and must be non-zero.
/// For `progress >= registry_size` the maintenance version is
/// `progress - registry_size + 1` and the action index is
/// `(version - 1) % cycle_len`.
pub fn plan_unit(progress: u64, registry_size: usize, cycle_len: usize) -> Unit {
    debug_assert!(cycle_len > 0, "maintenance cycle must not be empty");
    if progress < registry_size as u64 {
        return Unit::Step(progress as usize);
    }
    let version = progress - registry_size as u64 + 1;
    let cycle_index = ((version - 1) % cycle_len as u64) as usize;
    Unit::Maintenance {
        version,
        cycle_index,
    }
}
