//! Start/stop surface exposed to the UI layer.
//!
//! The controller owns the worker thread's lifecycle: it validates
//! preconditions before spawning (positive interval, git work tree present),
//! guards against double-start, and on `stop()` sets the cancellation flag
//! and joins, which is bounded by the scheduler's sub-second cancel polling.
//! It is also the read side of the worker's event channel, caching the
//! current progress and last log line for cheap observation.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::io::event_log::EventLog;
use crate::io::git::Git;
use crate::io::init::init_forge;
use crate::io::progress::ProgressStore;
use crate::maintenance::MaintenanceRotator;
use crate::registry::StepRegistry;
use crate::scheduler::{LoopContext, SchedulerEvent, run_loop};

/// Validation failure that prevents the loop from starting.
///
/// Detectable via `anyhow::Error::downcast_ref::<ConfigError>()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
}

struct Worker {
    handle: JoinHandle<()>,
    cancel: Arc<AtomicBool>,
}

/// Owns the build loop worker and exposes start/stop plus read-only observers.
pub struct Controller {
    root: std::path::PathBuf,
    registry: Arc<StepRegistry>,
    rotator: Arc<MaintenanceRotator>,
    worker: Option<Worker>,
    events: Option<Receiver<SchedulerEvent>>,
    progress: u64,
    last_log: Option<String>,
}

impl Controller {
    /// Controller over the built-in registry and maintenance cycle.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_components(
            root,
            StepRegistry::builtin(),
            MaintenanceRotator::builtin(),
        )
    }

    pub fn with_components(
        root: impl AsRef<Path>,
        registry: StepRegistry,
        rotator: MaintenanceRotator,
    ) -> Self {
        let root = root.as_ref().to_path_buf();
        let progress =
            ProgressStore::new(crate::io::init::ForgePaths::new(&root).progress_path).load();
        Self {
            root,
            registry: Arc::new(registry),
            rotator: Arc::new(rotator),
            worker: None,
            events: None,
            progress,
            last_log: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        if self.worker.is_some() {
            ControllerState::Running
        } else {
            ControllerState::Idle
        }
    }

    /// Current progress counter, as last observed from the worker (or the
    /// persisted value while idle).
    pub fn progress(&self) -> u64 {
        self.progress
    }

    /// Most recent log line observed from the worker.
    pub fn last_log(&self) -> Option<&str> {
        self.last_log.as_deref()
    }

    /// Validate preconditions and spawn the worker.
    ///
    /// Fails with [`ConfigError`] (leaving the controller `Idle`) when the
    /// interval is zero or the target directory is not a git work tree.
    /// Starting while already running is a no-op.
    pub fn start(&mut self, interval: Duration) -> Result<()> {
        if self.worker.is_some() {
            debug!("already running, start is a no-op");
            return Ok(());
        }

        if interval.as_secs() == 0 {
            return Err(ConfigError("interval must be a positive number of seconds".to_string()).into());
        }
        let git = Git::new(&self.root);
        if !git.is_work_tree().context("probe git work tree")? {
            return Err(ConfigError(format!(
                "no git repository found in {} (run `git init` first)",
                self.root.display()
            ))
            .into());
        }

        let paths = init_forge(&self.root)?;
        let ctx = LoopContext {
            root: self.root.clone(),
            registry: Arc::clone(&self.registry),
            rotator: Arc::clone(&self.rotator),
            store: ProgressStore::new(&paths.progress_path),
            event_log: EventLog::new(&paths.event_log_path),
            interval,
        };
        self.progress = ctx.store.load();

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let cancel_worker = Arc::clone(&cancel);
        let handle = std::thread::Builder::new()
            .name("siteforge-worker".to_string())
            .spawn(move || run_loop(&ctx, &cancel_worker, &tx))
            .context("spawn worker thread")?;

        info!(interval_secs = interval.as_secs(), "build loop started");
        self.worker = Some(Worker { handle, cancel });
        self.events = Some(rx);
        Ok(())
    }

    /// Request cancellation and wait for the worker to observe it.
    ///
    /// Blocks only as long as the scheduler's cancel poll granularity;
    /// stopping while idle is a no-op.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.cancel.store(true, Ordering::Relaxed);
        if worker.handle.join().is_err() {
            warn!("worker thread panicked during shutdown");
        }
        self.drain_events();
        self.events = None;
        info!("build loop stopped");
    }

    /// Drain pending worker events, updating the progress and last-log
    /// observers, and return them for display.
    pub fn poll_events(&mut self) -> Vec<SchedulerEvent> {
        self.drain_events()
    }

    fn drain_events(&mut self) -> Vec<SchedulerEvent> {
        let drained: Vec<SchedulerEvent> = match &self.events {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for event in &drained {
            match event {
                SchedulerEvent::Committed { progress, .. }
                | SchedulerEvent::NoOp { progress, .. } => self.progress = *progress,
                _ => {}
            }
            self.last_log = Some(event.to_string());
        }
        drained
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use crate::io::workspace::write_file;
    use crate::registry::Step;
    use crate::test_support::TestRepo;

    fn quick_registry() -> StepRegistry {
        StepRegistry::from_steps(vec![Step::new("marker", |root: &Path| {
            write_file(root, "marker.txt", "built\n")?;
            Ok("Add marker".to_string())
        })])
    }

    #[test]
    fn zero_interval_is_rejected_with_config_error() {
        let repo = TestRepo::new().expect("repo");
        let mut controller = Controller::new(repo.root());

        let err = controller
            .start(Duration::from_secs(0))
            .expect_err("zero interval");
        assert!(err.downcast_ref::<ConfigError>().is_some());
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn missing_repository_is_rejected_with_config_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut controller = Controller::new(temp.path());

        let err = controller
            .start(Duration::from_secs(60))
            .expect_err("no repo");
        let config = err.downcast_ref::<ConfigError>().expect("config error");
        assert!(config.to_string().contains("git"));
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn start_runs_a_unit_and_stop_observes_it() {
        let repo = TestRepo::new().expect("repo");
        let mut controller = Controller::with_components(
            repo.root(),
            quick_registry(),
            MaintenanceRotator::builtin(),
        );

        controller.start(Duration::from_secs(60)).expect("start");
        assert_eq!(controller.state(), ControllerState::Running);

        // The first unit runs immediately; wait for its commit to land.
        let deadline = Instant::now() + Duration::from_secs(10);
        while controller.progress() < 1 {
            controller.poll_events();
            assert!(Instant::now() < deadline, "worker never advanced");
            std::thread::sleep(Duration::from_millis(20));
        }

        controller.stop();
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(controller.progress(), 1);
        assert!(repo.root().join("marker.txt").exists());
        assert!(controller.last_log().is_some());
    }

    #[test]
    fn stop_returns_within_poll_granularity_despite_long_interval() {
        let repo = TestRepo::new().expect("repo");
        let mut controller = Controller::with_components(
            repo.root(),
            quick_registry(),
            MaintenanceRotator::builtin(),
        );

        controller.start(Duration::from_secs(3600)).expect("start");
        let deadline = Instant::now() + Duration::from_secs(10);
        while controller.progress() < 1 {
            controller.poll_events();
            assert!(Instant::now() < deadline, "worker never advanced");
            std::thread::sleep(Duration::from_millis(20));
        }

        // The worker is now inside its hour-long sleep.
        let stop_started = Instant::now();
        controller.stop();
        assert!(stop_started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn double_start_is_a_noop() {
        let repo = TestRepo::new().expect("repo");
        let mut controller = Controller::with_components(
            repo.root(),
            quick_registry(),
            MaintenanceRotator::builtin(),
        );

        controller.start(Duration::from_secs(60)).expect("start");
        controller.start(Duration::from_secs(60)).expect("restart");
        assert_eq!(controller.state(), ControllerState::Running);
        controller.stop();
    }

    #[test]
    fn stopping_while_idle_is_a_noop() {
        let repo = TestRepo::new().expect("repo");
        let mut controller = Controller::new(repo.root());
        controller.stop();
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn restart_resumes_from_persisted_progress() {
        let repo = TestRepo::new().expect("repo");
        let registry = StepRegistry::from_steps(vec![
            Step::new("first", |root: &Path| {
                write_file(root, "first.txt", "one\n")?;
                Ok("Add first".to_string())
            }),
            Step::new("second", |root: &Path| {
                write_file(root, "second.txt", "two\n")?;
                Ok("Add second".to_string())
            }),
        ]);
        let mut controller = Controller::with_components(
            repo.root(),
            registry,
            MaintenanceRotator::builtin(),
        );

        controller.start(Duration::from_secs(3600)).expect("start");
        let deadline = Instant::now() + Duration::from_secs(10);
        while controller.progress() < 1 {
            controller.poll_events();
            assert!(Instant::now() < deadline, "worker never advanced");
            std::thread::sleep(Duration::from_millis(20));
        }
        controller.stop();

        // A fresh start picks up where the persisted counter left off.
        controller.start(Duration::from_secs(3600)).expect("restart");
        let deadline = Instant::now() + Duration::from_secs(10);
        while controller.progress() < 2 {
            controller.poll_events();
            assert!(Instant::now() < deadline, "worker never advanced");
            std::thread::sleep(Duration::from_millis(20));
        }
        controller.stop();

        assert!(repo.root().join("first.txt").exists());
        assert!(repo.root().join("second.txt").exists());
        assert!(repo.commit_count().expect("count") >= 3);
    }
}
