//! Drive on a heading for a distance.

use std::time::Duration;

use tracing::info;

use tiller_command::{ClaimSet, Command};

use crate::commands::DriveOnHeadingCommand;
use crate::context::{DRIVE_CLAIM, RobotContext};

/// Drive on a heading until the average encoder distance reaches the
/// target, with the timeout as a backstop.
///
/// The encoders are reset at `init`, so the distance is measured from
/// where the command starts. A zero distance is already reached and
/// finishes on the very first check. Without encoders the distance query
/// pins at its −1 sentinel and never reaches the target; the command then
/// terminates on its timeout — distance-based termination degrades, the
/// time bound does not.
pub struct DriveDistanceCommand {
    drive: DriveOnHeadingCommand,
    distance: f64,
}

impl DriveDistanceCommand {
    pub fn new(
        distance: f64,
        heading: f64,
        speed: f64,
        timeout: Duration,
        brake_when_finished: bool,
    ) -> Self {
        Self {
            drive: DriveOnHeadingCommand::new(heading, speed, timeout, brake_when_finished),
            distance,
        }
    }
}

impl Command<RobotContext> for DriveDistanceCommand {
    fn name(&self) -> &str {
        "drive distance"
    }

    fn claims(&self) -> ClaimSet {
        DRIVE_CLAIM
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.drive.duration())
    }

    fn init(&mut self, ctx: &mut RobotContext) {
        ctx.drivetrain.reset_encoders();
        self.drive.engage(ctx);
    }

    fn execute(&mut self, ctx: &mut RobotContext) {
        self.drive.refresh(ctx);
    }

    fn is_finished(&mut self, ctx: &mut RobotContext) -> bool {
        if self.drive.errored() || ctx.input.cancel_requested() {
            return true;
        }

        let travelled = ctx.drivetrain.distance();
        if travelled >= self.distance {
            info!("drive distance reached {travelled} of {}", self.distance);
            return true;
        }

        false
    }

    fn end(&mut self, ctx: &mut RobotContext) {
        self.drive.stop(ctx);
    }
}
