//! # Tiller Robot
//!
//! The application layer tying the workspace together: configuration,
//! the application context, the drive commands, autonomous routine
//! compilation, and the fixed-rate tick loop.
//!
//! Per tick, in order:
//!
//! 1. operator input is polled once,
//! 2. the scheduler advances every active command,
//! 3. the drivetrain runs its control-loop math and publishes telemetry.
//!
//! Commands therefore always observe the previous tick's loop outputs,
//! never a partially recomputed current tick.

pub mod auto;
pub mod commands;
pub mod config;
pub mod context;
pub mod pacing;
pub mod telemetry;

pub use context::{DRIVE_CLAIM, RobotContext};
