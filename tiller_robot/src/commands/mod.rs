//! Drive commands.
//!
//! Each command is a thin lifecycle shell over the drivetrain operations:
//! `init` engages a mode, `execute` refreshes setpoints, `is_finished`
//! watches the completion condition (plus the operator cancel request),
//! and `end` guarantees the motors are told to brake or coast no matter
//! how the command exits.

mod default_drive;
mod drive_distance;
mod drive_on_heading;
mod rotate_to_heading;

pub use default_drive::DefaultDriveCommand;
pub use drive_distance::DriveDistanceCommand;
pub use drive_on_heading::DriveOnHeadingCommand;
pub use rotate_to_heading::RotateToHeadingCommand;

/// Valid heading range check shared by the heading-based commands.
pub(crate) fn heading_is_valid(heading: f64) -> bool {
    (0.0..360.0).contains(&heading)
}
