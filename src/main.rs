//! Scheduled site-build loop CLI.
//!
//! Drives the build engine from the terminal: `init` scaffolds engine state,
//! `status` reports the persisted progress and the next unit of work, `run`
//! starts the loop in the foreground until Ctrl-C, and `reset` deletes the
//! progress file to restart the build from step 0.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use siteforge::controller::Controller;
use siteforge::core::plan::{Unit, plan_unit};
use siteforge::exit_codes;
use siteforge::io::config::load_config;
use siteforge::io::init::{ForgePaths, init_forge};
use siteforge::io::progress::ProgressStore;
use siteforge::logging;
use siteforge::maintenance::MaintenanceRotator;
use siteforge::registry::StepRegistry;

#[derive(Parser)]
#[command(
    name = "siteforge",
    version,
    about = "Scheduled site-build loop that commits one generated step per interval"
)]
struct Cli {
    /// Project directory (a git work tree).
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.siteforge/` scaffolding (gitignore, default config) if missing.
    Init,
    /// Print current progress and the next unit of work.
    Status {
        /// Machine-readable JSON output.
        #[arg(long)]
        json: bool,
    },
    /// Run the build loop in the foreground until interrupted.
    Run {
        /// Seconds between units of work (defaults from config).
        #[arg(long)]
        interval_secs: Option<u64>,
    },
    /// Delete the progress file, restarting the build from step 0.
    Reset,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init => cmd_init(&cli.dir),
        Command::Status { json } => cmd_status(&cli.dir, json),
        Command::Run { interval_secs } => cmd_run(&cli.dir, interval_secs),
        Command::Reset => cmd_reset(&cli.dir),
    }
}

fn cmd_init(dir: &Path) -> Result<()> {
    let paths = init_forge(dir)?;
    println!("initialized {}", paths.forge_dir.display());
    Ok(())
}

fn cmd_status(dir: &Path, json: bool) -> Result<()> {
    let paths = ForgePaths::new(dir);
    let registry = StepRegistry::builtin();
    let rotator = MaintenanceRotator::builtin();
    let progress = ProgressStore::new(&paths.progress_path).load();
    let unit = plan_unit(progress, registry.len(), rotator.cycle_len());

    let next = match unit {
        Unit::Step(index) => format!(
            "feature step {index} ({})",
            registry.name(index).unwrap_or("unknown step")
        ),
        Unit::Maintenance {
            version,
            cycle_index,
        } => format!(
            "maintenance v{version} ({})",
            rotator.name(cycle_index).unwrap_or("unknown action")
        ),
    };

    if json {
        let payload = serde_json::json!({
            "progress": progress,
            "registry_size": registry.len(),
            "phase": unit.phase(),
            "next": next,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("progress: {progress} / {}+", registry.len());
        println!("next: {next}");
    }
    Ok(())
}

fn cmd_run(dir: &Path, interval_secs: Option<u64>) -> Result<()> {
    let paths = ForgePaths::new(dir);
    let interval_secs = match interval_secs {
        Some(secs) => secs,
        None => load_config(&paths.config_path)?.interval_secs,
    };

    let mut controller = Controller::new(dir);
    controller.start(Duration::from_secs(interval_secs))?;

    let stop_requested = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop_requested);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("install ctrl-c handler")?;

    println!("siteforge running (interval {interval_secs}s); press Ctrl-C to stop");
    loop {
        for event in controller.poll_events() {
            println!("{event}");
        }
        if stop_requested.load(Ordering::Relaxed) {
            controller.stop();
            if let Some(line) = controller.last_log() {
                println!("{line}");
            }
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(200));
    }
}

fn cmd_reset(dir: &Path) -> Result<()> {
    let paths = ForgePaths::new(dir);
    ProgressStore::new(&paths.progress_path).reset()?;
    println!("progress reset; the next run starts at step 0");
    Ok(())
}
