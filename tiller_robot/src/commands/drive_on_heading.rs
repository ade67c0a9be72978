//! Drive on a heading for a fixed time.

use std::time::Duration;

use tracing::warn;

use tiller_command::{ClaimSet, Command};

use crate::commands::heading_is_valid;
use crate::context::{DRIVE_CLAIM, RobotContext};

/// Drive on `heading` at `speed` until the timeout expires.
///
/// The timeout is the completion condition, not an error. A heading
/// outside [0, 360) or a drivetrain refusal (no gyro, zero gains) ends
/// the command on its first check instead of letting it hang.
pub struct DriveOnHeadingCommand {
    heading: f64,
    speed: f64,
    duration: Duration,
    brake_when_finished: bool,
    error: bool,
}

impl DriveOnHeadingCommand {
    pub fn new(
        heading: f64,
        speed: f64,
        duration: Duration,
        brake_when_finished: bool,
    ) -> Self {
        Self {
            heading,
            // Negative speeds are not allowed when tracking a heading;
            // drive the reciprocal heading instead.
            speed: speed.clamp(0.0, 1.0),
            duration,
            brake_when_finished,
            error: false,
        }
    }

    pub(crate) fn engage(&mut self, ctx: &mut RobotContext) {
        if !heading_is_valid(self.heading) {
            warn!(
                "drive on heading: heading must be >= 0 and < 360, {} is invalid; \
                 ending immediately",
                self.heading
            );
            self.error = true;
            return;
        }

        if !ctx.drivetrain.drive_on_heading(self.speed, self.heading) {
            // Refused (logged by the drivetrain): finish immediately
            // rather than hang until the timeout.
            self.error = true;
        }
    }

    pub(crate) fn refresh(&mut self, ctx: &mut RobotContext) {
        if self.error {
            return;
        }
        // Re-issue every tick: a no-op when nothing changed, and the hook
        // for future speed ramping.
        ctx.drivetrain.drive_on_heading(self.speed, self.heading);
    }

    pub(crate) fn errored(&self) -> bool {
        self.error
    }

    pub(crate) fn duration(&self) -> Duration {
        self.duration
    }

    pub(crate) fn stop(&self, ctx: &mut RobotContext) {
        if self.brake_when_finished {
            ctx.drivetrain.set_speed(0.0, 0.0);
            ctx.drivetrain.release_heading_hold();
        }
    }
}

impl Command<RobotContext> for DriveOnHeadingCommand {
    fn name(&self) -> &str {
        "drive on heading"
    }

    fn claims(&self) -> ClaimSet {
        DRIVE_CLAIM
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn init(&mut self, ctx: &mut RobotContext) {
        self.engage(ctx);
    }

    fn execute(&mut self, ctx: &mut RobotContext) {
        self.refresh(ctx);
    }

    fn is_finished(&mut self, ctx: &mut RobotContext) -> bool {
        self.error || ctx.input.cancel_requested()
    }

    fn end(&mut self, ctx: &mut RobotContext) {
        self.stop(ctx);
    }
}
