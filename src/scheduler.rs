//! The background build loop: plan, execute, commit, persist, wait.
//!
//! Exactly one worker thread runs [`run_loop`] at a time. Each pass reads the
//! persisted progress counter, derives the unit of work from it, executes and
//! commits that unit, advances the counter, then sleeps for the configured
//! interval while polling a cancellation flag at sub-second granularity so
//! `stop()` is observed promptly even for hour-long intervals.
//!
//! Failure semantics: a step error or a hard commit failure is reported and
//! the counter is left untouched, so the same unit is retried after the
//! normal interval. A no-op commit (unit regenerated identical bytes) is a
//! success and still advances the counter, otherwise a changeless unit would
//! wedge the loop on the same index forever.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::plan::{Unit, plan_unit};
use crate::io::event_log::EventLog;
use crate::io::git::{CommitOutcome, Git};
use crate::io::progress::ProgressStore;
use crate::maintenance::MaintenanceRotator;
use crate::registry::StepRegistry;

/// Cancellation is observed at this granularity, independent of the interval.
const CANCEL_POLL: Duration = Duration::from_millis(200);

/// Everything the worker thread needs to run the loop.
pub struct LoopContext {
    pub root: PathBuf,
    pub registry: Arc<StepRegistry>,
    pub rotator: Arc<MaintenanceRotator>,
    pub store: ProgressStore,
    pub event_log: EventLog,
    pub interval: Duration,
}

/// Notification sent from the worker to whoever is observing the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    Started,
    /// A unit of work is about to run. `progress` is the counter value that
    /// selected it.
    UnitStarted {
        progress: u64,
        unit: Unit,
        label: String,
    },
    /// A commit was created. `progress` is the advanced counter value.
    Committed { progress: u64, message: String },
    /// The unit regenerated identical content; nothing to commit. The counter
    /// still advanced to `progress`.
    NoOp { progress: u64, message: String },
    /// The unit or the commit failed; the counter was not advanced.
    Failed { progress: u64, reason: String },
    Waiting {
        phase: &'static str,
        interval_secs: u64,
    },
    Stopped,
}

impl fmt::Display for SchedulerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerEvent::Started => write!(f, "Build loop started."),
            SchedulerEvent::UnitStarted { label, .. } => write!(f, "Running {label}..."),
            SchedulerEvent::Committed { message, .. } => write!(f, "Committed: {message}"),
            SchedulerEvent::NoOp { .. } => write!(f, "Nothing new to commit (no changes)."),
            SchedulerEvent::Failed { reason, .. } => {
                write!(f, "Error: {reason} (will retry after the interval)")
            }
            SchedulerEvent::Waiting {
                phase,
                interval_secs,
            } => write!(f, "Next {phase} commit in {interval_secs}s. Waiting..."),
            SchedulerEvent::Stopped => write!(f, "Stopped."),
        }
    }
}

/// Result of one successful loop pass.
#[derive(Debug, Clone)]
pub struct IterationReport {
    /// Counter value that selected the unit.
    pub progress: u64,
    pub unit: Unit,
    pub message: String,
    pub outcome: CommitOutcome,
}

/// Execute exactly one unit of work: plan from the persisted counter, run the
/// step or maintenance action, commit, and persist the advanced counter.
///
/// Any error leaves the counter untouched so the same unit is selected again.
pub fn run_iteration(ctx: &LoopContext) -> Result<IterationReport> {
    let progress = ctx.store.load();
    let unit = plan_unit(progress, ctx.registry.len(), ctx.rotator.cycle_len());
    debug!(progress, ?unit, "executing unit of work");

    let message = match unit {
        Unit::Step(index) => ctx.registry.run(&ctx.root, index)?,
        Unit::Maintenance {
            version,
            cycle_index,
        } => ctx.rotator.run(&ctx.root, version, cycle_index)?,
    };

    let outcome = Git::new(&ctx.root).commit_all(&message)?;
    ctx.store.save(progress + 1)?;
    info!(progress = progress + 1, ?outcome, "unit completed");

    Ok(IterationReport {
        progress,
        unit,
        message,
        outcome,
    })
}

/// Run the loop until `cancel` is set.
///
/// Each pass emits events over `events` and appends them to the product event
/// log. The worker never terminates on a unit or commit failure; those are
/// reported and retried after the normal interval.
pub fn run_loop(ctx: &LoopContext, cancel: &AtomicBool, events: &Sender<SchedulerEvent>) {
    emit(ctx, events, SchedulerEvent::Started);

    while !cancel.load(Ordering::Relaxed) {
        let progress = ctx.store.load();
        let unit = plan_unit(progress, ctx.registry.len(), ctx.rotator.cycle_len());
        emit(
            ctx,
            events,
            SchedulerEvent::UnitStarted {
                progress,
                unit,
                label: unit_label(ctx, unit),
            },
        );

        match run_iteration(ctx) {
            Ok(report) => match report.outcome {
                CommitOutcome::Committed(message) => emit(
                    ctx,
                    events,
                    SchedulerEvent::Committed {
                        progress: report.progress + 1,
                        message,
                    },
                ),
                CommitOutcome::NoOp => emit(
                    ctx,
                    events,
                    SchedulerEvent::NoOp {
                        progress: report.progress + 1,
                        message: report.message,
                    },
                ),
            },
            Err(err) => {
                warn!(progress, err = %err, "iteration failed, progress not advanced");
                emit(
                    ctx,
                    events,
                    SchedulerEvent::Failed {
                        progress,
                        reason: format!("{err:#}"),
                    },
                );
            }
        }

        emit(
            ctx,
            events,
            SchedulerEvent::Waiting {
                phase: unit.phase(),
                interval_secs: ctx.interval.as_secs(),
            },
        );
        if sleep_with_cancel(ctx.interval, cancel) {
            break;
        }
    }

    emit(ctx, events, SchedulerEvent::Stopped);
}

/// Sleep for `total`, polling `cancel` at [`CANCEL_POLL`] granularity.
///
/// Returns true if cancellation was observed before the sleep elapsed.
pub fn sleep_with_cancel(total: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep((deadline - now).min(CANCEL_POLL));
    }
}

fn unit_label(ctx: &LoopContext, unit: Unit) -> String {
    match unit {
        Unit::Step(index) => {
            let name = ctx.registry.name(index).unwrap_or("unknown step");
            format!("feature step {index} ({name})")
        }
        Unit::Maintenance {
            version,
            cycle_index,
        } => {
            let name = ctx.rotator.name(cycle_index).unwrap_or("unknown action");
            format!("maintenance v{version} ({name})")
        }
    }
}

fn emit(ctx: &LoopContext, events: &Sender<SchedulerEvent>, event: SchedulerEvent) {
    if let Err(err) = ctx.event_log.append(&event.to_string()) {
        warn!(err = %err, "failed to append event log");
    }
    if events.send(event).is_err() {
        debug!("event receiver dropped");
    }
}
