//! Standing teleop drive command.

use tiller_command::{ClaimSet, Command};
use tiller_control::drivetrain::HeadingMode;
use tiller_control::mixer::DriveMixer;

use crate::config::DriveStyle;
use crate::context::{DRIVE_CLAIM, RobotContext};

/// Default command for the drivetrain: mixes the operator's sticks into
/// wheel speeds every tick.
///
/// Registered as the scheduler default for [`DRIVE_CLAIM`], so it is
/// evicted whenever an autonomous command takes the drivetrain and comes
/// back the moment the claim frees up. Never finishes on its own.
///
/// Extra operator controls handled here:
/// - heading reset request re-zeroes the tracker,
/// - the speed-PID toggle flips between closed- and open-loop driving,
/// - holding the rotate hat pivots onto the requested heading; releasing
///   it returns to stick control.
pub struct DefaultDriveCommand {
    mixer: DriveMixer,
    style: DriveStyle,
}

impl DefaultDriveCommand {
    pub fn new(mixer: DriveMixer, style: DriveStyle) -> Self {
        Self { mixer, style }
    }
}

impl Command<RobotContext> for DefaultDriveCommand {
    fn name(&self) -> &str {
        "default drive"
    }

    fn claims(&self) -> ClaimSet {
        DRIVE_CLAIM
    }

    fn execute(&mut self, ctx: &mut RobotContext) {
        if ctx.input.reset_heading_requested() {
            ctx.drivetrain.reset_heading();
        }

        if ctx.input.speed_pid_toggle_pressed() {
            if ctx.drivetrain.speed_pids_enabled() {
                ctx.drivetrain.disable_speed_pids();
                ctx.drivetrain.set_speed(0.0, 0.0);
            } else {
                ctx.drivetrain.enable_speed_pids();
            }
        }

        if let Some(target) = ctx.input.rotate_target() {
            // Re-issued every tick while the hat is held; the setpoint
            // just follows the hat.
            ctx.drivetrain.rotate_to_heading(target, None);
            return;
        }

        if ctx.drivetrain.mode() == HeadingMode::RotateToHeading {
            // Hat released: hand control back to the sticks.
            ctx.drivetrain.release_heading_hold();
        }

        let speeds = match self.style {
            DriveStyle::Arcade => self
                .mixer
                .arcade_sticks(ctx.input.left_stick(), ctx.input.right_stick()),
            DriveStyle::SingleStick => self.mixer.arcade_single(ctx.input.left_stick()),
            DriveStyle::Tank => self
                .mixer
                .tank(ctx.input.left_stick(), ctx.input.right_stick()),
        };
        ctx.drivetrain.set_speed(speeds.left, speeds.right);
    }

    fn is_finished(&mut self, _ctx: &mut RobotContext) -> bool {
        false
    }

    fn end(&mut self, ctx: &mut RobotContext) {
        ctx.drivetrain.set_speed(0.0, 0.0);
        if ctx.drivetrain.heading_hold_active() {
            ctx.drivetrain.release_heading_hold();
        }
    }
}
