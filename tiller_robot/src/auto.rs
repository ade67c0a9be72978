//! Autonomous routines as configuration.
//!
//! A routine is data, not code: a named list of steps loaded from
//! `auto.toml` and compiled into a [`CommandGroup`] at start. Game-specific
//! sequencing lives entirely in the config file; the code knows only the
//! step vocabulary.
//!
//! ```toml
//! [[routines]]
//! name = "straight"
//!
//! [[routines.steps]]
//! action = "drive_distance"
//! distance = 25.0
//! heading = 0.0
//! speed = 0.6
//! timeout_s = 15.0
//!
//! [[routines.steps]]
//! action = "rotate_to"
//! heading = 90.0
//!
//! [[routines.steps]]
//! action = "wait"
//! seconds = 0.5
//! ```
//!
//! A step with `parallel = true` runs alongside the next sequential step
//! and is cancelled at that step's boundary if still running.

use std::time::Duration;

use serde::Deserialize;

use tiller_command::{CommandGroup, WaitCommand};
use tiller_common::config::ConfigError;

use crate::commands::{DriveDistanceCommand, DriveOnHeadingCommand, RotateToHeadingCommand};
use crate::context::{RobotCommand, RobotContext};

fn default_true() -> bool {
    true
}

fn default_timeout_s() -> f64 {
    15.0
}

/// One autonomous step.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepConfig {
    /// Drive on a heading until a distance is covered.
    DriveDistance {
        distance: f64,
        heading: f64,
        speed: f64,
        #[serde(default = "default_timeout_s")]
        timeout_s: f64,
        #[serde(default = "default_true")]
        brake: bool,
        #[serde(default)]
        parallel: bool,
    },
    /// Drive on a heading for a fixed time.
    DriveTime {
        heading: f64,
        speed: f64,
        seconds: f64,
        #[serde(default = "default_true")]
        brake: bool,
        #[serde(default)]
        parallel: bool,
    },
    /// Pivot onto a heading.
    RotateTo {
        heading: f64,
        #[serde(default)]
        max_output: Option<f64>,
        #[serde(default = "default_timeout_s")]
        timeout_s: f64,
        #[serde(default)]
        parallel: bool,
    },
    /// Do nothing for a while.
    Wait {
        seconds: f64,
        #[serde(default)]
        parallel: bool,
    },
}

impl StepConfig {
    fn parallel(&self) -> bool {
        match *self {
            StepConfig::DriveDistance { parallel, .. }
            | StepConfig::DriveTime { parallel, .. }
            | StepConfig::RotateTo { parallel, .. }
            | StepConfig::Wait { parallel, .. } => parallel,
        }
    }

    fn build(&self) -> RobotCommand {
        match *self {
            StepConfig::DriveDistance {
                distance,
                heading,
                speed,
                timeout_s,
                brake,
                ..
            } => Box::new(DriveDistanceCommand::new(
                distance,
                heading,
                speed,
                Duration::from_secs_f64(timeout_s),
                brake,
            )),
            StepConfig::DriveTime {
                heading,
                speed,
                seconds,
                brake,
                ..
            } => Box::new(DriveOnHeadingCommand::new(
                heading,
                speed,
                Duration::from_secs_f64(seconds),
                brake,
            )),
            StepConfig::RotateTo {
                heading,
                max_output,
                timeout_s,
                ..
            } => Box::new(RotateToHeadingCommand::new(
                heading,
                max_output,
                Duration::from_secs_f64(timeout_s),
            )),
            StepConfig::Wait { seconds, .. } => {
                Box::new(WaitCommand::new(Duration::from_secs_f64(seconds)))
            }
        }
    }

    fn validate(&self, routine: &str, index: usize) -> Result<(), ConfigError> {
        let reject = |message: String| Err(ConfigError::ValidationError(message));

        match *self {
            StepConfig::DriveDistance {
                distance,
                heading,
                speed,
                timeout_s,
                ..
            } => {
                if distance < 0.0 {
                    return reject(format!(
                        "routine '{routine}' step {index}: distance must not be negative"
                    ));
                }
                validate_heading(routine, index, heading)?;
                validate_speed(routine, index, speed)?;
                validate_seconds(routine, index, timeout_s)
            }
            StepConfig::DriveTime {
                heading,
                speed,
                seconds,
                ..
            } => {
                validate_heading(routine, index, heading)?;
                validate_speed(routine, index, speed)?;
                validate_seconds(routine, index, seconds)
            }
            StepConfig::RotateTo {
                heading, timeout_s, ..
            } => {
                validate_heading(routine, index, heading)?;
                validate_seconds(routine, index, timeout_s)
            }
            StepConfig::Wait { seconds, .. } => validate_seconds(routine, index, seconds),
        }
    }
}

fn validate_heading(routine: &str, index: usize, heading: f64) -> Result<(), ConfigError> {
    if (0.0..360.0).contains(&heading) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "routine '{routine}' step {index}: heading {heading} outside [0, 360)"
        )))
    }
}

fn validate_speed(routine: &str, index: usize, speed: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&speed) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "routine '{routine}' step {index}: speed {speed} outside [0, 1]"
        )))
    }
}

fn validate_seconds(routine: &str, index: usize, seconds: f64) -> Result<(), ConfigError> {
    if seconds >= 0.0 && seconds.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "routine '{routine}' step {index}: duration {seconds} invalid"
        )))
    }
}

/// One named routine.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutineConfig {
    pub name: String,
    pub steps: Vec<StepConfig>,
}

impl RoutineConfig {
    /// Compile the routine into a schedulable command group.
    pub fn compile(&self) -> CommandGroup<RobotContext> {
        let mut group = CommandGroup::new(self.name.clone());
        for step in &self.steps {
            group = if step.parallel() {
                group.add_parallel(step.build())
            } else {
                group.add_sequential(step.build())
            };
        }
        group
    }
}

/// The `auto.toml` root: every selectable routine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AutoConfig {
    pub routines: Vec<RoutineConfig>,
}

impl AutoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for routine in &self.routines {
            if routine.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "routine name cannot be empty".to_string(),
                ));
            }
            for (index, step) in routine.steps.iter().enumerate() {
                step.validate(&routine.name, index)?;
            }
        }
        Ok(())
    }

    /// Look up a routine by name.
    pub fn routine(&self, name: &str) -> Option<&RoutineConfig> {
        self.routines.iter().find(|routine| routine.name == name)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
