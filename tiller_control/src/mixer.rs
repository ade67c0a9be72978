//! Differential drive mixing: stick positions in, wheel speeds out.
//!
//! Pure input→output math with no state beyond the configured deadbands.
//! Three styles:
//!
//! - arcade with separate speed/rotation inputs,
//! - arcade from a single stick (magnitude-renormalized so diagonal
//!   deflection still reaches full speed),
//! - tank with one stick per side.
//!
//! All styles apply an input deadband (stick noise), a response curve
//! (fine control at low deflection, full output at the top), and a motor
//! deadband (outputs too small to turn a wheel are snapped to 0).

use tracing::warn;

use tiller_hal::input::StickPosition;

/// Left/right wheel speed fractions, each in [-1.0, 1.0].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelSpeeds {
    pub left: f64,
    pub right: f64,
}

impl WheelSpeeds {
    pub const fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }
}

/// Stick-to-wheel-speed calculator for a differential drive.
#[derive(Debug, Clone, Copy)]
pub struct DriveMixer {
    input_deadband: f64,
    motor_deadband: f64,
}

impl Default for DriveMixer {
    fn default() -> Self {
        Self {
            input_deadband: Self::DEFAULT_INPUT_DEADBAND,
            motor_deadband: Self::DEFAULT_MOTOR_DEADBAND,
        }
    }
}

impl DriveMixer {
    pub const DEFAULT_INPUT_DEADBAND: f64 = 0.07;
    pub const DEFAULT_MOTOR_DEADBAND: f64 = 0.03;

    /// Largest deadband magnitude that still leaves a usable stick range.
    pub const MAX_DEADBAND: f64 = 0.25;

    /// Build a mixer with the given deadbands.
    ///
    /// A deadband magnitude above [`Self::MAX_DEADBAND`] is a configuration
    /// error: the default is substituted and a warning logged. Never fails.
    pub fn new(input_deadband: f64, motor_deadband: f64) -> Self {
        let input_deadband = if input_deadband.abs() > Self::MAX_DEADBAND {
            warn!(
                "invalid input deadband ({input_deadband}), using default {}",
                Self::DEFAULT_INPUT_DEADBAND
            );
            Self::DEFAULT_INPUT_DEADBAND
        } else {
            input_deadband.abs()
        };

        let motor_deadband = if motor_deadband.abs() > Self::MAX_DEADBAND {
            warn!(
                "invalid motor deadband ({motor_deadband}), using default {}",
                Self::DEFAULT_MOTOR_DEADBAND
            );
            Self::DEFAULT_MOTOR_DEADBAND
        } else {
            motor_deadband.abs()
        };

        Self {
            input_deadband,
            motor_deadband,
        }
    }

    /// Arcade mix from explicit speed and rotation inputs.
    ///
    /// When the scaled speed dominates the rotation, the robot drives with
    /// one side trimmed by the rotation (steer-while-driving). Otherwise it
    /// pivots, with the speed added as a bias on the stationary side so a
    /// small forward input curves the pivot instead of fighting it.
    pub fn arcade(&self, speed: f64, rotation: f64) -> WheelSpeeds {
        // Nothing above the stick noise floor: no output.
        if !(speed.abs() > self.input_deadband || rotation.abs() > self.input_deadband) {
            return WheelSpeeds::default();
        }

        let scaled_speed = self.scale(speed);
        let scaled_rotation = self.scale(rotation);

        let mut left;
        let mut right;

        if scaled_speed.abs() > rotation.abs() {
            // Drive forward or reverse with steering.
            left = scaled_speed;
            right = scaled_speed;

            if speed > 0.0 {
                if rotation > 0.0 {
                    right -= scaled_rotation;
                } else {
                    left += scaled_rotation;
                }
            } else {
                // Reversing steers from the other side so the stick keeps
                // pointing where the robot goes.
                if rotation > 0.0 {
                    left += scaled_rotation;
                } else {
                    right -= scaled_rotation;
                }
            }
        } else {
            // Rotate on the spot; the speed input shifts the pivot point
            // toward the slower side.
            left = scaled_rotation;
            right = -scaled_rotation;

            if rotation > 0.0 {
                if speed > 0.0 {
                    right += scaled_speed;
                } else {
                    left += scaled_speed;
                }
            } else if speed > 0.0 {
                left += scaled_speed;
            } else {
                right += scaled_speed;
            }
        }

        if left.abs() <= self.motor_deadband {
            left = 0.0;
        }
        if right.abs() <= self.motor_deadband {
            right = 0.0;
        }

        WheelSpeeds::new(left, right)
    }

    /// Arcade mix from a single stick.
    ///
    /// A stick at 45° reads roughly (0.7, 0.7) on the raw axes, which would
    /// cap diagonal driving at 70%. The deflection is re-scaled so the
    /// dominant axis carries the full stick magnitude before delegating to
    /// [`DriveMixer::arcade`].
    pub fn arcade_single(&self, stick: StickPosition) -> WheelSpeeds {
        // Forward stick is negative y by joystick convention.
        let y = -stick.y;
        let x = stick.x;

        let magnitude = (x * x + y * y).sqrt();

        let mut scaled_x = 0.0;
        let mut scaled_y = 0.0;

        if x.abs() > y.abs() {
            scaled_x = magnitude * x.signum();
            if x != 0.0 {
                scaled_y = magnitude * (y / x).abs() * y.signum();
            }
        } else {
            scaled_y = magnitude * y.signum();
            if y != 0.0 {
                scaled_x = magnitude * (x / y).abs() * x.signum();
            }
        }

        self.arcade(scaled_y, scaled_x)
    }

    /// Arcade mix from two sticks: left stick speed, right stick rotation.
    pub fn arcade_sticks(&self, left: StickPosition, right: StickPosition) -> WheelSpeeds {
        self.arcade(-left.y, right.x)
    }

    /// Tank mix: each stick's y-axis drives its side directly.
    pub fn tank(&self, left: StickPosition, right: StickPosition) -> WheelSpeeds {
        let mut left_speed = -left.y;
        let mut right_speed = -right.y;

        if left_speed.abs() <= self.input_deadband || left_speed.abs() <= self.motor_deadband {
            left_speed = 0.0;
        }
        if right_speed.abs() <= self.input_deadband || right_speed.abs() <= self.motor_deadband {
            right_speed = 0.0;
        }

        WheelSpeeds::new(left_speed, right_speed)
    }

    #[inline]
    pub fn input_deadband(&self) -> f64 {
        self.input_deadband
    }

    #[inline]
    pub fn motor_deadband(&self) -> f64 {
        self.motor_deadband
    }

    /// Two-segment response curve.
    ///
    /// Values up to 0.6 are halved for fine control; above 0.6 a linear
    /// ramp runs from 0.3 up to full output at 1.0.
    fn scale(&self, value: f64) -> f64 {
        let value = value.clamp(-1.0, 1.0);
        let magnitude = value.abs();

        if magnitude <= self.input_deadband {
            return 0.0;
        }

        if magnitude <= 0.6 {
            return value / 2.0;
        }

        (0.3 + (magnitude - 0.6) * 7.0 / 4.0) * value.signum()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn mixer() -> DriveMixer {
        DriveMixer::default()
    }

    #[test]
    fn inputs_below_deadband_give_zero_output() {
        let speeds = mixer().arcade(0.05, 0.0);
        assert_eq!(speeds, WheelSpeeds::default());

        let speeds = mixer().arcade(0.0, 0.06);
        assert_eq!(speeds, WheelSpeeds::default());
    }

    #[test]
    fn input_just_above_deadband_drives() {
        let speeds = mixer().arcade(0.08, 0.0);
        assert!(speeds.left > 0.0);
        assert_eq!(speeds.left, speeds.right);
    }

    #[test]
    fn straight_drive_uses_response_curve() {
        // 0.8 is on the upper curve segment: 0.3 + 0.2 * 7/4 = 0.65.
        let speeds = mixer().arcade(0.8, 0.0);
        assert!((speeds.left - 0.65).abs() < EPS);
        assert!((speeds.right - 0.65).abs() < EPS);

        // 0.4 is on the lower segment: halved.
        let speeds = mixer().arcade(0.4, 0.0);
        assert!((speeds.left - 0.2).abs() < EPS);
    }

    #[test]
    fn full_deflection_reaches_full_output() {
        let speeds = mixer().arcade(1.0, 0.0);
        assert!((speeds.left - 1.0).abs() < EPS);
        assert!((speeds.right - 1.0).abs() < EPS);
    }

    #[test]
    fn forward_with_right_rotation_slows_right_wheel() {
        let speeds = mixer().arcade(0.8, 0.3);
        assert!((speeds.left - 0.65).abs() < EPS);
        assert!((speeds.right - 0.5).abs() < EPS); // 0.65 - 0.15
    }

    #[test]
    fn forward_with_left_rotation_slows_left_wheel() {
        let speeds = mixer().arcade(0.8, -0.3);
        assert!((speeds.left - 0.5).abs() < EPS);
        assert!((speeds.right - 0.65).abs() < EPS);
    }

    #[test]
    fn rotation_dominates_into_a_pivot() {
        let speeds = mixer().arcade(0.0, 0.8);
        assert!((speeds.left - 0.65).abs() < EPS);
        assert!((speeds.right + 0.65).abs() < EPS);
    }

    #[test]
    fn pivot_with_forward_bias_shifts_the_slow_side() {
        // Rotation 0.8 dominates speed 0.2; the scaled speed (0.1) is
        // added to the inner wheel.
        let speeds = mixer().arcade(0.2, 0.8);
        assert!((speeds.left - 0.65).abs() < EPS);
        assert!((speeds.right - (-0.65 + 0.1)).abs() < EPS);
    }

    #[test]
    fn tiny_wheel_outputs_snap_to_zero() {
        // Rotation just over the input deadband scales to 0.04, leaving
        // the output above the motor deadband; drop rotation lower via a
        // custom motor deadband to show the snap.
        let mixer = DriveMixer::new(0.07, 0.05);
        let speeds = mixer.arcade(0.09, 0.0);
        // scale(0.09) = 0.045 <= 0.05 motor deadband on both wheels.
        assert_eq!(speeds, WheelSpeeds::default());
    }

    #[test]
    fn single_stick_diagonal_recovers_full_magnitude() {
        // 45 degrees forward-right at ~0.7 per axis.
        let speeds = mixer().arcade_single(StickPosition::new(0.7, -0.7));
        let straight = mixer().arcade(0.99, 0.0);

        // The dominant axis carries the full ~0.99 magnitude, so the fast
        // wheel matches a nearly-full straight drive.
        assert!((speeds.left - straight.left).abs() < 0.02);
    }

    #[test]
    fn single_stick_centered_is_zero() {
        let speeds = mixer().arcade_single(StickPosition::new(0.0, 0.0));
        assert_eq!(speeds, WheelSpeeds::default());
    }

    #[test]
    fn tank_drives_each_side_from_its_stick() {
        let speeds = mixer().tank(
            StickPosition::new(0.0, -0.5),
            StickPosition::new(0.0, 0.5),
        );
        assert_eq!(speeds, WheelSpeeds::new(0.5, -0.5));
    }

    #[test]
    fn tank_applies_both_deadbands_per_side() {
        let speeds = mixer().tank(
            StickPosition::new(0.0, -0.05),
            StickPosition::new(0.0, -0.5),
        );
        assert_eq!(speeds.left, 0.0);
        assert_eq!(speeds.right, 0.5);
    }

    #[test]
    fn oversized_deadbands_fall_back_to_defaults() {
        let mixer = DriveMixer::new(0.9, -0.5);
        assert_eq!(mixer.input_deadband(), DriveMixer::DEFAULT_INPUT_DEADBAND);
        assert_eq!(mixer.motor_deadband(), DriveMixer::DEFAULT_MOTOR_DEADBAND);
    }

    #[test]
    fn negative_deadbands_use_magnitude() {
        let mixer = DriveMixer::new(-0.1, -0.02);
        assert_eq!(mixer.input_deadband(), 0.1);
        assert_eq!(mixer.motor_deadband(), 0.02);
    }
}
