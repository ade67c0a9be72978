//! Pivot onto a heading.

use std::time::Duration;

use tracing::{info, warn};

use tiller_command::{ClaimSet, Command};
use tiller_common::util::round_places;

use crate::commands::heading_is_valid;
use crate::context::{DRIVE_CLAIM, RobotContext};

/// Pivot the robot on the spot onto `heading`.
///
/// Finishes when the heading error is within tolerance **and** the
/// rotation rate has dropped — ending on error alone would declare
/// success in the middle of an overshoot. Always brakes and releases the
/// heading hold at the end.
pub struct RotateToHeadingCommand {
    heading: f64,
    max_output: Option<f64>,
    duration: Duration,
    error: bool,
}

impl RotateToHeadingCommand {
    /// Heading error tolerance, degrees.
    const TOLERANCE_DEG: f64 = 1.5;
    /// Maximum rotation rate at completion, degrees/second.
    const SETTLED_RATE_DEG_S: f64 = 3.0;

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(heading: f64, max_output: Option<f64>, duration: Duration) -> Self {
        Self {
            heading,
            max_output,
            duration,
            error: false,
        }
    }

    /// Rotate with the drivetrain's configured rotation output and the
    /// default 5 second timeout.
    pub fn with_defaults(heading: f64) -> Self {
        Self::new(heading, None, Self::DEFAULT_TIMEOUT)
    }
}

impl Command<RobotContext> for RotateToHeadingCommand {
    fn name(&self) -> &str {
        "rotate to heading"
    }

    fn claims(&self) -> ClaimSet {
        DRIVE_CLAIM
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn init(&mut self, ctx: &mut RobotContext) {
        if !heading_is_valid(self.heading) {
            warn!(
                "rotate to heading: heading must be >= 0 and < 360, {} is invalid; \
                 ending immediately",
                self.heading
            );
            self.error = true;
            return;
        }

        if !ctx.drivetrain.rotate_to_heading(self.heading, self.max_output) {
            self.error = true;
        }
    }

    fn is_finished(&mut self, ctx: &mut RobotContext) -> bool {
        if self.error || ctx.input.cancel_requested() {
            return true;
        }

        let heading_error = ctx.drivetrain.heading_error();
        let rate = ctx.drivetrain.rotation_rate();

        if heading_error.abs() <= Self::TOLERANCE_DEG && rate.abs() < Self::SETTLED_RATE_DEG_S {
            info!(
                "rotate finished at heading {} with error {}, rate {}",
                round_places(ctx.drivetrain.heading().unwrap_or(0.0), 1),
                round_places(heading_error, 2),
                round_places(rate, 1)
            );
            return true;
        }

        false
    }

    fn end(&mut self, ctx: &mut RobotContext) {
        // Always brake out of a pivot.
        ctx.drivetrain.set_speed(0.0, 0.0);
        ctx.drivetrain.release_heading_hold();
    }
}
