//! Application context.
//!
//! One explicit struct constructed at startup and passed by mutable
//! reference into every command lifecycle call and the tick loop. No
//! globals: anything a command needs — subsystems, operator input,
//! telemetry — lives here, which is also what makes the whole stack
//! drivable from tests with sim backends.

use tiller_command::{ClaimSet, Command};
use tiller_common::telemetry::Telemetry;
use tiller_control::DriveTrain;
use tiller_hal::input::OperatorInput;

/// Claim bit for the drivetrain subsystem.
pub const DRIVE_CLAIM: ClaimSet = ClaimSet::single(0);

pub struct RobotContext {
    pub drivetrain: DriveTrain,
    pub input: Box<dyn OperatorInput>,
    pub telemetry: Box<dyn Telemetry>,
}

impl RobotContext {
    pub fn new(
        drivetrain: DriveTrain,
        input: Box<dyn OperatorInput>,
        telemetry: Box<dyn Telemetry>,
    ) -> Self {
        Self {
            drivetrain,
            input,
            telemetry,
        }
    }

    /// Run the per-tick subsystem updates. Called by the tick loop after
    /// the scheduler has advanced every command.
    pub fn update_subsystems(&mut self) {
        self.drivetrain.update(self.telemetry.as_mut());
    }
}

/// Command over the robot context.
pub type RobotCommand = Box<dyn Command<RobotContext>>;
