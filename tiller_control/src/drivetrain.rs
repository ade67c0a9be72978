//! Differential drivetrain with closed-loop speed and heading control.
//!
//! Owns the left/right actuator+encoder pairs, the two wheel speed loops,
//! and (when a gyro is fitted) the heading tracker and heading loop. All
//! control math runs once per tick in [`DriveTrain::update`]; commands only
//! change setpoints and modes between ticks.
//!
//! Heading-based steering splits on error magnitude:
//!
//! - **Coarse** (|error| above the mode's threshold): reset the integral and
//!   pivot in place toward the setpoint at the rotation-limited output. The
//!   steering indicator saturates at ±1.0.
//! - **Fine**: use the heading loop's output directly — while driving on a
//!   heading the outer wheel is slowed by the steering fraction (never
//!   reversed); while rotating to a heading both wheels carry half the
//!   output in opposite directions, capped at the rotation speed.

use tracing::warn;

use tiller_common::telemetry::Telemetry;
use tiller_common::util::round_places;
use tiller_hal::device::{Actuator, Encoder};

use crate::heading::HeadingTracker;
use crate::pid::{HeadingLoop, LoopGains, SpeedLoop};

/// Heading-hold mode. Manual driving is simply `Disabled` plus direct
/// [`DriveTrain::set_speed`] calls from the operator's command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingMode {
    /// Heading loop off; callers set wheel speeds directly.
    #[default]
    Disabled,
    /// Track a heading while advancing at the speed setpoint.
    DriveOnHeading,
    /// Pivot in place onto a heading.
    RotateToHeading,
}

/// Error magnitude above which drive-on-heading pivots before tracking.
const DRIVE_PIVOT_THRESHOLD_DEG: f64 = 30.0;
/// Error magnitude above which rotate-to-heading runs open pivot.
const ROTATE_PIVOT_THRESHOLD_DEG: f64 = 20.0;

/// Fallback rotation output when a configured value is unusable.
const DEFAULT_MAX_ROTATION_OUTPUT: f64 = 0.5;

struct EncoderPair {
    left: Box<dyn Encoder>,
    right: Box<dyn Encoder>,
}

struct HeadingAssembly {
    tracker: HeadingTracker,
    pid: HeadingLoop,
    max_rotation_output: f64,
}

pub struct DriveTrain {
    left: Box<dyn Actuator>,
    right: Box<dyn Actuator>,

    encoders: Option<EncoderPair>,
    left_speed_pid: SpeedLoop,
    right_speed_pid: SpeedLoop,
    speed_pids_enabled: bool,
    max_encoder_speed: f64,
    counts_per_unit: f64,

    heading: Option<HeadingAssembly>,
    mode: HeadingMode,
    speed_setpoint: f64,
    steering: f64,
}

impl DriveTrain {
    /// Open-loop drivetrain: two actuators, no feedback.
    ///
    /// Attach encoders and a heading tracker afterwards to unlock the
    /// closed-loop operations.
    pub fn new(left: Box<dyn Actuator>, right: Box<dyn Actuator>) -> Self {
        Self {
            left,
            right,
            encoders: None,
            left_speed_pid: SpeedLoop::new(LoopGains::new(0.0, 0.0)),
            right_speed_pid: SpeedLoop::new(LoopGains::new(0.0, 0.0)),
            speed_pids_enabled: false,
            max_encoder_speed: 1.0,
            counts_per_unit: 0.0,
            heading: None,
            mode: HeadingMode::Disabled,
            speed_setpoint: 0.0,
            steering: 0.0,
        }
    }

    /// Attach the wheel encoders and configure the speed loops.
    ///
    /// `counts_per_unit` of 0 makes distance queries return raw counts.
    /// `max_encoder_speed` is the loaded full-output encoder rate used to
    /// normalize speed feedback.
    pub fn attach_encoders(
        &mut self,
        left: Box<dyn Encoder>,
        right: Box<dyn Encoder>,
        counts_per_unit: f64,
        gains: LoopGains,
        max_encoder_speed: f64,
    ) {
        self.encoders = Some(EncoderPair { left, right });
        self.counts_per_unit = counts_per_unit;
        self.left_speed_pid.set_gains(gains);
        self.right_speed_pid.set_gains(gains);
        self.set_max_encoder_speed(max_encoder_speed);
    }

    /// Attach the heading tracker and configure the heading loop.
    pub fn attach_heading(
        &mut self,
        tracker: HeadingTracker,
        gains: LoopGains,
        max_rotation_output: f64,
    ) {
        let max_rotation_output = if max_rotation_output <= 0.0 || max_rotation_output > 1.0 {
            warn!(
                "invalid max rotation output ({max_rotation_output}), \
                 using {DEFAULT_MAX_ROTATION_OUTPUT}"
            );
            DEFAULT_MAX_ROTATION_OUTPUT
        } else {
            max_rotation_output
        };

        self.heading = Some(HeadingAssembly {
            tracker,
            pid: HeadingLoop::new(gains),
            max_rotation_output,
        });
    }

    // ── Speed control ───────────────────────────────────────────────

    /// Set the wheel speeds.
    ///
    /// With the speed PIDs enabled this only moves the loop setpoints; the
    /// next [`DriveTrain::update`] drives the actuators from the loop
    /// outputs. With the PIDs disabled the fractions go to the actuators
    /// directly — the open-loop degradation path for a robot with
    /// unreliable encoders.
    pub fn set_speed(&mut self, left: f64, right: f64) {
        if self.speed_pids_enabled {
            self.left_speed_pid.set_setpoint(left);
            self.right_speed_pid.set_setpoint(right);
        } else {
            self.left.set(left);
            self.right.set(right);
        }
    }

    /// Enable closed-loop wheel speed control.
    ///
    /// Refused (with a warning) when no encoders are attached or the
    /// proportional gain is unset; the drivetrain stays open-loop.
    pub fn enable_speed_pids(&mut self) {
        if self.speed_pids_enabled {
            return;
        }

        if self.encoders.is_none() {
            warn!("speed PIDs cannot be enabled without encoders");
            return;
        }

        if self.left_speed_pid.gains().kp == 0.0 {
            warn!("speed PIDs cannot be enabled until the proportional gain is set");
            return;
        }

        self.left_speed_pid.enable();
        self.right_speed_pid.enable();
        self.speed_pids_enabled = true;
    }

    /// Disable closed-loop wheel speed control.
    ///
    /// Does not change the motor outputs; call [`DriveTrain::set_speed`]
    /// afterwards to take over open-loop.
    pub fn disable_speed_pids(&mut self) {
        if self.speed_pids_enabled {
            self.left_speed_pid.disable();
            self.right_speed_pid.disable();
            self.speed_pids_enabled = false;
        }
    }

    #[inline]
    pub fn speed_pids_enabled(&self) -> bool {
        self.speed_pids_enabled
    }

    /// Update the speed loop gains; both-zero gains disable the loops.
    pub fn set_speed_pid_gains(&mut self, gains: LoopGains) {
        self.left_speed_pid.set_gains(gains);
        self.right_speed_pid.set_gains(gains);

        if gains.is_zero() {
            self.disable_speed_pids();
        }
    }

    /// Set the loaded full-output encoder rate used to normalize feedback.
    pub fn set_max_encoder_speed(&mut self, max_encoder_speed: f64) {
        if max_encoder_speed <= 0.0 {
            warn!("max encoder speed must be positive, ignoring {max_encoder_speed}");
            return;
        }
        self.max_encoder_speed = max_encoder_speed;
    }

    // ── Heading control ─────────────────────────────────────────────

    /// Track `heading` while advancing at `speed`.
    ///
    /// Returns `false` (refusing the operation) when no heading tracker is
    /// attached or the heading gains are zero; the caller must treat a
    /// refusal as "finish immediately" rather than waiting forever.
    pub fn drive_on_heading(&mut self, speed: f64, heading: f64) -> bool {
        let Some(assembly) = self.heading.as_mut() else {
            warn!("drive on heading requires a heading tracker");
            return false;
        };

        if assembly.pid.gains().is_zero() {
            warn!("heading hold cannot engage until the loop kp or ki is set");
            return false;
        }

        self.mode = HeadingMode::DriveOnHeading;
        self.speed_setpoint = speed;
        Self::engage(assembly, heading);
        true
    }

    /// Pivot in place onto `heading`.
    ///
    /// `max_output` limits the pivot speed; `None` or an out-of-range value
    /// falls back to the configured maximum (with a warning for the
    /// latter). Same refusal rules as [`DriveTrain::drive_on_heading`].
    pub fn rotate_to_heading(&mut self, heading: f64, max_output: Option<f64>) -> bool {
        let Some(assembly) = self.heading.as_mut() else {
            warn!("rotate to heading requires a heading tracker");
            return false;
        };

        if assembly.pid.gains().is_zero() {
            warn!("heading hold cannot engage until the loop kp or ki is set");
            return false;
        }

        let speed = match max_output {
            None => assembly.max_rotation_output,
            Some(requested) if requested <= 0.0 || requested > assembly.max_rotation_output => {
                warn!(
                    "cannot rotate at output {requested}, overriding to {}",
                    assembly.max_rotation_output
                );
                assembly.max_rotation_output
            }
            Some(requested) => requested,
        };

        self.mode = HeadingMode::RotateToHeading;
        self.speed_setpoint = speed;
        Self::engage(assembly, heading);
        true
    }

    /// Disengage the heading hold and return to manual speed control.
    pub fn release_heading_hold(&mut self) {
        if let Some(assembly) = self.heading.as_mut() {
            assembly.pid.disable();
        }
        self.speed_setpoint = 0.0;
        self.mode = HeadingMode::Disabled;
    }

    fn engage(assembly: &mut HeadingAssembly, heading: f64) {
        assembly.pid.set_setpoint(heading);
        if !assembly.pid.is_enabled() {
            assembly.pid.enable();
            // Prime the cached error so the first steering decision does
            // not act on stale state.
            assembly.pid.calculate(assembly.tracker.heading());
        }
    }

    /// Update the heading loop gains; both-zero gains release the hold.
    pub fn set_heading_pid_gains(&mut self, gains: LoopGains) {
        let Some(assembly) = self.heading.as_mut() else {
            return;
        };
        assembly.pid.set_gains(gains);

        if gains.is_zero() {
            self.release_heading_hold();
        }
    }

    #[inline]
    pub fn mode(&self) -> HeadingMode {
        self.mode
    }

    /// Whether the heading loop is currently engaged.
    pub fn heading_hold_active(&self) -> bool {
        self.heading
            .as_ref()
            .is_some_and(|assembly| assembly.pid.is_enabled())
    }

    /// Current heading in [0, 360), or `None` without a heading tracker.
    pub fn heading(&self) -> Option<f64> {
        self.heading
            .as_ref()
            .map(|assembly| assembly.tracker.heading())
    }

    /// Signed error to the heading setpoint; 0 while the hold is disengaged.
    pub fn heading_error(&self) -> f64 {
        match &self.heading {
            Some(assembly) => assembly.pid.error_from(assembly.tracker.heading()),
            None => 0.0,
        }
    }

    /// Rotation rate in degrees/second; 0 without a heading tracker.
    pub fn rotation_rate(&self) -> f64 {
        self.heading
            .as_ref()
            .map_or(0.0, |assembly| assembly.tracker.rate())
    }

    /// Declare the current orientation to be `angle` degrees.
    pub fn set_heading(&mut self, angle: f64) {
        if let Some(assembly) = self.heading.as_mut() {
            assembly.tracker.set_heading(angle);
        }
    }

    /// Re-zero the heading.
    pub fn reset_heading(&mut self) {
        self.set_heading(0.0);
    }

    /// Steering indicator from the last tick: ±1.0 while pivoting
    /// coarsely, the loop output while tracking, 0 when disengaged.
    #[inline]
    pub fn steering(&self) -> f64 {
        self.steering
    }

    // ── Distance tracking ───────────────────────────────────────────

    /// Average of the wheel encoder counts, or −1 without encoders.
    pub fn distance_counts(&self) -> i32 {
        match &self.encoders {
            Some(pair) => (pair.left.get() + pair.right.get()) / 2,
            None => -1,
        }
    }

    /// Distance in configured physical units (2 decimal places), raw
    /// counts when no scale is configured, −1.0 without encoders.
    pub fn distance(&self) -> f64 {
        if self.encoders.is_none() {
            return -1.0;
        }

        let counts = f64::from(self.distance_counts());
        if self.counts_per_unit == 0.0 {
            counts
        } else {
            round_places(counts / self.counts_per_unit, 2)
        }
    }

    /// Average encoder rate in counts/second, or −1.0 without encoders.
    pub fn encoder_speed(&self) -> f64 {
        match &self.encoders {
            Some(pair) => (pair.left.rate() + pair.right.rate()) / 2.0,
            None => -1.0,
        }
    }

    /// Zero both wheel encoders.
    pub fn reset_encoders(&mut self) {
        if let Some(pair) = self.encoders.as_mut() {
            pair.left.reset();
            pair.right.reset();
        }
    }

    // ── Per-tick update ─────────────────────────────────────────────

    /// Run all control-loop math for this tick and publish telemetry.
    ///
    /// Order matters: heading steering first (it moves the speed
    /// setpoints), then the speed loops (they drive the actuators from
    /// those setpoints). Commands executing earlier in the tick therefore
    /// always observe the previous tick's loop outputs.
    pub fn update(&mut self, telemetry: &mut dyn Telemetry) {
        let mut steering = 0.0;
        let mut steered_speeds = None;

        if let Some(assembly) = self.heading.as_mut() {
            if assembly.pid.is_enabled() {
                let heading = assembly.tracker.heading();
                assembly.pid.calculate(heading);

                let steered = match self.mode {
                    HeadingMode::DriveOnHeading => {
                        Some(drive_on_heading_speeds(assembly, self.speed_setpoint))
                    }
                    HeadingMode::RotateToHeading => {
                        Some(rotate_to_heading_speeds(assembly, self.speed_setpoint))
                    }
                    HeadingMode::Disabled => None,
                };
                if let Some((left, right, indicator)) = steered {
                    steering = indicator;
                    steered_speeds = Some((left, right));
                }
            }
        }

        if let Some((left, right)) = steered_speeds {
            self.set_speed(left, right);
        }
        self.steering = steering;

        if let Some(pair) = &self.encoders {
            if self.speed_pids_enabled {
                let left_out = self
                    .left_speed_pid
                    .calculate(pair.left.rate() / self.max_encoder_speed);
                let right_out = self
                    .right_speed_pid
                    .calculate(pair.right.rate() / self.max_encoder_speed);
                self.left.set(left_out);
                self.right.set(right_out);
            }
        }

        self.publish(telemetry);
    }

    fn publish(&self, telemetry: &mut dyn Telemetry) {
        telemetry.publish_number("drive/steering", self.steering);
        telemetry.publish_number("drive/left_output", self.left.get());
        telemetry.publish_number("drive/right_output", self.right.get());
        telemetry.publish_bool("drive/speed_pids", self.speed_pids_enabled);

        if let Some(pair) = &self.encoders {
            telemetry.publish_number("drive/left_counts", f64::from(pair.left.get()));
            telemetry.publish_number("drive/right_counts", f64::from(pair.right.get()));
            telemetry.publish_number("drive/avg_counts", f64::from(self.distance_counts()));
            telemetry.publish_number("drive/avg_speed", self.encoder_speed());
            telemetry.publish_number("drive/distance", self.distance());
        }

        if let Some(assembly) = &self.heading {
            telemetry.publish_number("drive/heading", assembly.tracker.heading());
            telemetry.publish_number(
                "drive/heading_error",
                assembly.pid.error_from(assembly.tracker.heading()),
            );
        }
    }

    /// Stop everything: release the heading hold, disable the speed
    /// loops, and zero both actuators. Used on robot disable/shutdown.
    pub fn disable(&mut self) {
        self.release_heading_hold();
        self.disable_speed_pids();
        self.left.set(0.0);
        self.right.set(0.0);
    }
}

/// Steering for `DriveOnHeading`, returning (left, right, indicator).
fn drive_on_heading_speeds(assembly: &mut HeadingAssembly, speed_setpoint: f64) -> (f64, f64, f64) {
    let error = assembly.pid.error_from(assembly.tracker.heading());

    if error.abs() > DRIVE_PIVOT_THRESHOLD_DEG {
        // Too far off axis to steer through: clear the integral and pivot
        // toward the heading before tracking starts.
        assembly.pid.reset();

        let mut speed = speed_setpoint.min(assembly.max_rotation_output);
        let indicator = if error < 0.0 {
            speed = -speed;
            -1.0
        } else {
            1.0
        };

        return (speed, -speed, indicator);
    }

    let steering = assembly.pid.get();
    let mut left = speed_setpoint;
    let mut right = speed_setpoint;

    // Slow the outer wheel only — the robot keeps advancing while it
    // converges on the heading.
    if steering > 0.0 {
        right = left * (1.0 - steering);
    }
    if steering < 0.0 {
        left = right * (1.0 + steering);
    }

    (left, right, steering)
}

/// Steering for `RotateToHeading`, returning (left, right, indicator).
fn rotate_to_heading_speeds(assembly: &mut HeadingAssembly, speed_setpoint: f64) -> (f64, f64, f64) {
    let error = assembly.pid.error_from(assembly.tracker.heading());

    if error.abs() > ROTATE_PIVOT_THRESHOLD_DEG {
        assembly.pid.reset();

        let mut speed = speed_setpoint;
        let indicator = if error < 0.0 {
            speed = -speed;
            -1.0
        } else {
            1.0
        };

        return (speed, -speed, indicator);
    }

    // Both wheels carry the rotation, which doubles the effective gain,
    // so the loop output is halved for the pivot.
    let steering = assembly.pid.get() / 2.0;

    let mut speed = steering;
    if steering.abs() > speed_setpoint {
        speed = steering.signum() * speed_setpoint;
    }

    (speed, -speed, steering)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tiller_common::telemetry::{NullTelemetry, RecordingTelemetry};
    use tiller_hal::sim::{SimActuator, SimEncoder, SimGyro};

    struct Rig {
        drive: DriveTrain,
        left: SimActuator,
        right: SimActuator,
        left_enc: SimEncoder,
        right_enc: SimEncoder,
        gyro: SimGyro,
    }

    fn rig() -> Rig {
        let left = SimActuator::new();
        let right = SimActuator::new();
        let left_enc = SimEncoder::new();
        let right_enc = SimEncoder::new();
        let gyro = SimGyro::new();

        let mut drive = DriveTrain::new(Box::new(left.clone()), Box::new(right.clone()));
        drive.attach_encoders(
            Box::new(left_enc.clone()),
            Box::new(right_enc.clone()),
            100.0,
            LoopGains::new(0.5, 0.0),
            1000.0,
        );
        drive.attach_heading(
            HeadingTracker::new(Box::new(gyro.clone()), false),
            LoopGains::new(0.02, 0.0),
            0.7,
        );

        Rig {
            drive,
            left,
            right,
            left_enc,
            right_enc,
            gyro,
        }
    }

    #[test]
    fn open_loop_set_speed_hits_actuators_directly() {
        let mut rig = rig();
        rig.drive.set_speed(0.4, -0.4);
        assert_eq!(rig.left.get(), 0.4);
        assert_eq!(rig.right.get(), -0.4);
    }

    #[test]
    fn speed_pids_route_setpoints_through_the_loops() {
        let mut rig = rig();
        rig.drive.enable_speed_pids();
        assert!(rig.drive.speed_pids_enabled());

        rig.drive.set_speed(0.5, 0.5);
        // Setpoint only — actuators untouched until the tick runs.
        assert_eq!(rig.left.get(), 0.0);

        // Wheels already at the target rate: output equals feed-forward.
        rig.left_enc.set_rate(500.0);
        rig.right_enc.set_rate(500.0);
        rig.drive.update(&mut NullTelemetry);
        assert!((rig.left.get() - 0.5).abs() < 1e-12);
        assert!((rig.right.get() - 0.5).abs() < 1e-12);

        // A lagging wheel gets pushed above the feed-forward term.
        rig.left_enc.set_rate(300.0);
        rig.drive.update(&mut NullTelemetry);
        assert!(rig.left.get() > 0.5);
    }

    #[test]
    fn speed_pids_refuse_without_encoders() {
        let left = SimActuator::new();
        let right = SimActuator::new();
        let mut drive = DriveTrain::new(Box::new(left.clone()), Box::new(right));

        drive.enable_speed_pids();
        assert!(!drive.speed_pids_enabled());

        // Open-loop fallback still drives.
        drive.set_speed(0.3, 0.3);
        assert_eq!(left.get(), 0.3);
    }

    #[test]
    fn zero_speed_gains_disable_the_loops() {
        let mut rig = rig();
        rig.drive.enable_speed_pids();
        assert!(rig.drive.speed_pids_enabled());

        rig.drive.set_speed_pid_gains(LoopGains::new(0.0, 0.0));
        assert!(!rig.drive.speed_pids_enabled());
    }

    #[test]
    fn drive_on_heading_refuses_zero_gains() {
        let mut rig = rig();
        rig.drive.set_heading_pid_gains(LoopGains::new(0.0, 0.0));
        assert!(!rig.drive.drive_on_heading(0.5, 90.0));
        assert_eq!(rig.drive.mode(), HeadingMode::Disabled);
    }

    #[test]
    fn drive_on_heading_refuses_without_gyro() {
        let left = SimActuator::new();
        let right = SimActuator::new();
        let mut drive = DriveTrain::new(Box::new(left), Box::new(right));
        assert!(!drive.drive_on_heading(0.5, 90.0));
    }

    #[test]
    fn large_error_pivots_at_rotation_limit() {
        let mut rig = rig();
        rig.gyro.set_angle(0.0);
        assert!(rig.drive.drive_on_heading(1.0, 90.0));

        rig.drive.update(&mut NullTelemetry);

        // Error +90 > 30: pivot clockwise, speed capped at 0.7.
        assert_eq!(rig.left.get(), 0.7);
        assert_eq!(rig.right.get(), -0.7);
        assert_eq!(rig.drive.steering(), 1.0);
    }

    #[test]
    fn large_negative_error_pivots_the_other_way() {
        let mut rig = rig();
        rig.gyro.set_angle(90.0);
        assert!(rig.drive.drive_on_heading(0.6, 0.0));

        rig.drive.update(&mut NullTelemetry);

        assert_eq!(rig.left.get(), -0.6);
        assert_eq!(rig.right.get(), 0.6);
        assert_eq!(rig.drive.steering(), -1.0);
    }

    #[test]
    fn small_error_trims_the_outer_wheel() {
        let mut rig = rig();
        rig.gyro.set_angle(80.0);
        assert!(rig.drive.drive_on_heading(0.5, 90.0));

        rig.drive.update(&mut NullTelemetry);

        // Error +10, kp 0.02 → steering 0.2: right wheel slowed, never
        // reversed; left carries the full speed.
        assert_eq!(rig.left.get(), 0.5);
        assert!((rig.right.get() - 0.5 * 0.8).abs() < 1e-9);
        assert!((rig.drive.steering() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn small_negative_error_trims_the_left_wheel() {
        let mut rig = rig();
        rig.gyro.set_angle(100.0);
        assert!(rig.drive.drive_on_heading(0.5, 90.0));

        rig.drive.update(&mut NullTelemetry);

        assert!((rig.left.get() - 0.5 * 0.8).abs() < 1e-9);
        assert_eq!(rig.right.get(), 0.5);
    }

    #[test]
    fn rotate_fine_mode_pivots_at_half_output() {
        let mut rig = rig();
        rig.gyro.set_angle(80.0);
        assert!(rig.drive.rotate_to_heading(90.0, None));

        rig.drive.update(&mut NullTelemetry);

        // Error +10 (below the 20 degree pivot threshold), kp 0.02 →
        // loop output 0.2, halved to 0.1, both wheels opposite.
        assert!((rig.left.get() - 0.1).abs() < 1e-9);
        assert!((rig.right.get() + 0.1).abs() < 1e-9);
    }

    #[test]
    fn rotate_caps_pivot_at_speed_setpoint() {
        let mut rig = rig();
        rig.gyro.set_angle(75.0);
        assert!(rig.drive.rotate_to_heading(90.0, Some(0.05)));

        rig.drive.update(&mut NullTelemetry);

        // Loop output 0.3 halved to 0.15, capped at the 0.05 setpoint.
        assert!((rig.left.get() - 0.05).abs() < 1e-9);
        assert!((rig.right.get() + 0.05).abs() < 1e-9);
    }

    #[test]
    fn rotate_with_invalid_output_falls_back_to_configured_max() {
        let mut rig = rig();
        rig.gyro.set_angle(0.0);
        assert!(rig.drive.rotate_to_heading(90.0, Some(2.0)));

        rig.drive.update(&mut NullTelemetry);
        // Coarse pivot at the configured 0.7 maximum.
        assert_eq!(rig.left.get(), 0.7);
    }

    #[test]
    fn opposite_heading_pivots_deterministically() {
        let mut rig = rig();
        rig.gyro.set_angle(10.0);
        assert!(rig.drive.rotate_to_heading(190.0, None));

        for _ in 0..5 {
            rig.drive.update(&mut NullTelemetry);
            // Error is exactly +180: always clockwise, never flapping.
            assert_eq!(rig.drive.steering(), 1.0);
        }
    }

    #[test]
    fn release_heading_hold_returns_to_manual() {
        let mut rig = rig();
        assert!(rig.drive.drive_on_heading(0.5, 90.0));
        assert!(rig.drive.heading_hold_active());

        rig.drive.release_heading_hold();
        assert!(!rig.drive.heading_hold_active());
        assert_eq!(rig.drive.mode(), HeadingMode::Disabled);
        assert_eq!(rig.drive.heading_error(), 0.0);
    }

    #[test]
    fn distance_converts_counts_to_units() {
        let mut rig = rig();
        rig.left_enc.set_counts(400);
        rig.right_enc.set_counts(600);

        // Average 500 counts at 100 counts/unit.
        assert_eq!(rig.drive.distance_counts(), 500);
        assert_eq!(rig.drive.distance(), 5.0);

        rig.drive.reset_encoders();
        assert_eq!(rig.drive.distance(), 0.0);
    }

    #[test]
    fn distance_without_encoders_is_sentinel() {
        let drive = DriveTrain::new(
            Box::new(SimActuator::new()),
            Box::new(SimActuator::new()),
        );
        assert_eq!(drive.distance_counts(), -1);
        assert_eq!(drive.distance(), -1.0);
        assert_eq!(drive.encoder_speed(), -1.0);
    }

    #[test]
    fn set_heading_re_zeroes_the_tracker() {
        let mut rig = rig();
        rig.gyro.set_angle(123.0);
        rig.drive.set_heading(90.0);
        assert_eq!(rig.drive.heading(), Some(90.0));

        rig.drive.reset_heading();
        assert_eq!(rig.drive.heading(), Some(0.0));
    }

    #[test]
    fn update_publishes_drive_telemetry() {
        let mut rig = rig();
        let mut telemetry = RecordingTelemetry::default();

        rig.gyro.set_angle(45.0);
        rig.left_enc.set_counts(200);
        rig.right_enc.set_counts(200);
        rig.drive.update(&mut telemetry);

        assert_eq!(telemetry.number("drive/heading"), Some(45.0));
        assert_eq!(telemetry.number("drive/avg_counts"), Some(200.0));
        assert_eq!(telemetry.number("drive/distance"), Some(2.0));
        assert_eq!(telemetry.bool("drive/speed_pids"), Some(false));
    }

    #[test]
    fn disable_zeroes_everything() {
        let mut rig = rig();
        rig.drive.enable_speed_pids();
        assert!(rig.drive.drive_on_heading(0.5, 90.0));
        rig.drive.update(&mut NullTelemetry);

        rig.drive.disable();
        assert_eq!(rig.left.get(), 0.0);
        assert_eq!(rig.right.get(), 0.0);
        assert!(!rig.drive.speed_pids_enabled());
        assert!(!rig.drive.heading_hold_active());
    }
}
