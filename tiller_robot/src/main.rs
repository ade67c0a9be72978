//! # Tiller Robot
//!
//! Control program for a differential-drive competition robot: closed-loop
//! heading and wheel-speed control under a cooperative command scheduler,
//! all driven from a fixed 20 ms tick.
//!
//! This binary wires the simulation backends from `tiller_hal` — the same
//! seams a real robot fills with motor-controller and gyro drivers — which
//! makes it a headless test bench: load a config, optionally schedule an
//! autonomous routine, and run. Teleop input comes through the operator
//! seam and does nothing under the scripted backend.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use tiller_command::Scheduler;
use tiller_common::config::{ConfigError, ConfigLoader};
use tiller_common::telemetry::{LogTelemetry, Telemetry};
use tiller_control::mixer::DriveMixer;
use tiller_control::{DriveTrain, HeadingTracker};
use tiller_hal::device::FilteredGyro;
use tiller_hal::{Actuator, Encoder};
use tiller_hal::sim::{ScriptedInput, SimActuator, SimEncoder, SimGyro};
use tiller_robot::auto::AutoConfig;
use tiller_robot::commands::DefaultDriveCommand;
use tiller_robot::config::RobotConfig;
use tiller_robot::context::{DRIVE_CLAIM, RobotContext};
use tiller_robot::pacing::TickLoop;
use tiller_robot::telemetry::JsonlTelemetry;

/// Tiller Robot — differential drive control loop
#[derive(Parser, Debug)]
#[command(name = "tiller_robot")]
#[command(version)]
#[command(about = "Cooperative command scheduler and drive control for a tank-drive robot")]
struct Args {
    /// Path to the robot configuration TOML.
    #[arg(default_value = "config/robot.toml")]
    config: PathBuf,

    /// Path to the autonomous routine TOML.
    #[arg(long, default_value = "config/auto.toml")]
    auto_config: PathBuf,

    /// Autonomous routine to schedule at startup.
    #[arg(long)]
    routine: Option<String>,

    /// Stop after this many ticks (0 = run until shutdown signal).
    #[arg(long, default_value_t = 0)]
    ticks: u64,

    /// Write JSON-lines telemetry to this file instead of the log.
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("Tiller Robot v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Tiller Robot shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = RobotConfig::load(&args.config)?;
    config.validate()?;
    info!(
        "Config OK: tick={}ms, style={:?}",
        config.tick.period_ms, config.drive.style
    );

    let auto = load_auto_config(&args.auto_config, args.routine.is_some())?;

    // ── Hardware (simulation backends) ──
    let mut left = SimActuator::new();
    let mut right = SimActuator::new();
    left.set_inverted(config.drive.left_inverted);
    right.set_inverted(config.drive.right_inverted);

    let mut left_encoder = SimEncoder::new();
    let mut right_encoder = SimEncoder::new();
    left_encoder.set_inverted(config.drive.left_encoder_inverted);
    right_encoder.set_inverted(config.drive.right_encoder_inverted);

    let gyro = FilteredGyro::new(SimGyro::new());
    let mut tracker = HeadingTracker::new(Box::new(gyro), config.drive.gyro_inverted);
    tracker.calibrate()?;

    let mut drivetrain = DriveTrain::new(Box::new(left), Box::new(right));
    drivetrain.attach_encoders(
        Box::new(left_encoder),
        Box::new(right_encoder),
        config.drive.counts_per_unit,
        config.drive.speed_pid.gains(),
        config.drive.max_encoder_speed,
    );
    drivetrain.attach_heading(
        tracker,
        config.drive.heading_pid.gains(),
        config.drive.max_rotation_output,
    );

    let telemetry: Box<dyn Telemetry> = match &args.telemetry {
        Some(path) => {
            info!("Writing telemetry to {}", path.display());
            Box::new(JsonlTelemetry::new(std::fs::File::create(path)?))
        }
        None => Box::new(LogTelemetry),
    };

    let mut ctx = RobotContext::new(drivetrain, Box::new(ScriptedInput::new()), telemetry);

    // ── Scheduler ──
    let mut scheduler: Scheduler<RobotContext> = Scheduler::new();

    let mixer = DriveMixer::new(config.drive.input_deadband, config.drive.motor_deadband);
    let style = config.drive.style;
    scheduler.set_default(DRIVE_CLAIM, move || {
        Box::new(DefaultDriveCommand::new(mixer, style))
    });

    if let Some(name) = &args.routine {
        let Some(routine) = auto.routine(name) else {
            return Err(Box::new(ConfigError::ValidationError(format!(
                "routine '{name}' not found in {}",
                args.auto_config.display()
            ))));
        };
        info!("Scheduling autonomous routine '{name}' ({} steps)", routine.steps.len());
        scheduler.schedule(Box::new(routine.compile()));
    } else {
        info!("No routine selected, teleop only");
    }

    // ── Shutdown signal ──
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    // ── Tick loop ──
    let mut ticker = TickLoop::new(std::time::Duration::from_millis(config.tick.period_ms));
    let max_ticks = args.ticks;
    info!("Entering tick loop");

    ticker.run(&running, |tick| {
        ctx.input.poll();
        scheduler.tick(&mut ctx);
        ctx.update_subsystems();

        max_ticks == 0 || tick + 1 < max_ticks
    });

    let stats = ticker.stats();
    info!(
        "Loop exited after {} ticks (avg {}µs, max {}µs, {} overruns)",
        stats.tick_count,
        stats.avg_tick_us(),
        stats.max_tick_us,
        stats.overruns
    );

    // Every command gets its end(); the drivetrain is left braked.
    scheduler.cancel_all(&mut ctx);
    ctx.drivetrain.disable();

    Ok(())
}

/// Load `auto.toml`. A missing file is only an error when a routine was
/// explicitly requested.
fn load_auto_config(path: &Path, required: bool) -> Result<AutoConfig, Box<dyn std::error::Error>> {
    match AutoConfig::load(path) {
        Ok(auto) => {
            auto.validate()?;
            info!("Loaded {} autonomous routines", auto.routines.len());
            Ok(auto)
        }
        Err(ConfigError::FileNotFound) if !required => {
            info!("No auto config at {}, continuing without routines", path.display());
            Ok(AutoConfig::default())
        }
        Err(e) => {
            warn!("Failed to load auto config: {e}");
            Err(Box::new(e))
        }
    }
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
