//! Proportional+integral control loops with anti-windup.
//!
//! Two specializations of the same discrete-time loop:
//!
//! - [`SpeedLoop`] drives a wheel toward a normalized speed setpoint. The
//!   setpoint doubles as the feed-forward term, since under load the
//!   setpoint fraction is approximately the output fraction that holds it.
//! - [`HeadingLoop`] drives the chassis heading toward a setpoint angle,
//!   using the signed shortest-path error.
//!
//! Both clamp their output to ±1.0 and clamp the integral accumulator by
//! back-calculation so the integral contribution can never push a later
//! output past the bound. `calculate` must be called once per tick at a
//! consistent rate while the loop is enabled.

use tracing::warn;

use crate::angles::shortest_path_error;

/// Proportional and integral gains for one control loop.
///
/// A zero `ki` disables the integral term entirely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopGains {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain (0 = disabled).
    pub ki: f64,
}

impl LoopGains {
    pub const fn new(kp: f64, ki: f64) -> Self {
        Self { kp, ki }
    }

    /// True when both gains are zero — the loop can do no work.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.kp == 0.0 && self.ki == 0.0
    }
}

// ─── Speed loop ─────────────────────────────────────────────────────

/// PI loop for wheel speed with setpoint feed-forward.
///
/// Feedback is the encoder rate normalized by the maximum loaded encoder
/// speed, so both setpoint and measurement live in [-1.0, 1.0].
#[derive(Debug, Clone)]
pub struct SpeedLoop {
    gains: LoopGains,
    setpoint: f64,
    total_error: f64,
    output: f64,
    enabled: bool,
}

impl SpeedLoop {
    /// Feedback beyond this magnitude is treated as sensor noise and
    /// clamped before the error is computed.
    const MAX_FEEDBACK: f64 = 1.5;

    pub fn new(gains: LoopGains) -> Self {
        Self {
            gains,
            setpoint: 0.0,
            total_error: 0.0,
            output: 0.0,
            enabled: false,
        }
    }

    /// Compute one cycle of the loop.
    ///
    /// `normalized_rate` is the encoder rate scaled by the maximum encoder
    /// speed. Returns 0 and leaves all state untouched while disabled; the
    /// result is also readable via [`SpeedLoop::get`].
    pub fn calculate(&mut self, normalized_rate: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }

        let rate = normalized_rate.clamp(-Self::MAX_FEEDBACK, Self::MAX_FEEDBACK);
        let error = self.setpoint - rate;

        let proportional = (self.gains.kp * error).clamp(-1.0, 1.0);

        // The setpoint itself is the feed-forward term.
        let mut total = (self.setpoint + proportional).clamp(-1.0, 1.0);

        if self.gains.ki != 0.0 {
            if self.setpoint == 0.0 {
                // At rest the integral would only accumulate drift.
                self.total_error = 0.0;
            } else {
                self.total_error += error;

                let integral = self.total_error * self.gains.ki;

                if integral + total > 1.0 {
                    // Back-solve the accumulator that exactly saturates.
                    self.total_error = (1.0 - total) / self.gains.ki;
                    total = 1.0;
                } else if integral + total < -1.0 {
                    self.total_error = (-1.0 - total) / self.gains.ki;
                    total = -1.0;
                } else {
                    total += integral;
                }
            }
        }

        self.output = total;
        self.output
    }

    /// Last computed output. Zero after a disable.
    #[inline]
    pub fn get(&self) -> f64 {
        self.output
    }

    /// Set the target speed fraction.
    ///
    /// Values outside [-1.0, 1.0] are clamped with a warning: a speed
    /// controller cannot be asked for more than full output.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        let clamped = setpoint.clamp(-1.0, 1.0);
        if clamped != setpoint {
            warn!(
                "speed setpoint {setpoint} outside [-1.0, 1.0], overriding to {clamped}"
            );
        }
        self.setpoint = clamped;
    }

    #[inline]
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable the loop and clear the accumulator and output.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.total_error = 0.0;
        self.output = 0.0;
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn gains(&self) -> LoopGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: LoopGains) {
        self.gains = gains;
    }
}

// ─── Heading loop ───────────────────────────────────────────────────

/// PI loop for chassis heading.
///
/// The output is a steering fraction in ±1.0. The error is the signed
/// shortest-path distance from the measured heading to the setpoint, so a
/// setpoint of 10° with a measurement of 350° steers +20°, not −340°.
#[derive(Debug, Clone)]
pub struct HeadingLoop {
    gains: LoopGains,
    setpoint: f64,
    error: f64,
    total_error: f64,
    output: f64,
    enabled: bool,
}

impl HeadingLoop {
    pub fn new(gains: LoopGains) -> Self {
        Self {
            gains,
            setpoint: 0.0,
            error: 0.0,
            total_error: 0.0,
            output: 0.0,
            enabled: false,
        }
    }

    /// Compute one cycle of the loop from the current gyro angle.
    ///
    /// Returns 0 and leaves all state untouched while disabled; the result
    /// is also readable via [`HeadingLoop::get`].
    pub fn calculate(&mut self, current_angle: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }

        self.error = shortest_path_error(self.setpoint, current_angle);

        let proportional = (self.gains.kp * self.error).clamp(-1.0, 1.0);
        let mut total = proportional;

        if self.gains.ki != 0.0 {
            self.total_error += self.error;

            let mut integral = self.total_error * self.gains.ki;

            // Clamp the accumulator so integral + proportional can just
            // reach the bound but never pass it.
            if integral + proportional > 1.0 {
                self.total_error = (1.0 - proportional) / self.gains.ki;
            }
            if integral + proportional < -1.0 {
                self.total_error = (-1.0 - proportional) / self.gains.ki;
            }

            integral = self.total_error * self.gains.ki;
            total = (proportional + integral).clamp(-1.0, 1.0);
        }

        self.output = total;
        self.output
    }

    /// Last computed steering output. Zero after a disable.
    #[inline]
    pub fn get(&self) -> f64 {
        self.output
    }

    /// Error cached by the last [`HeadingLoop::calculate`] call.
    #[inline]
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Shortest-path error for an arbitrary angle, without touching loop
    /// state. Returns 0 while the loop is disabled.
    pub fn error_from(&self, current_angle: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        shortest_path_error(self.setpoint, current_angle)
    }

    /// Set the target heading in degrees. Any angle is accepted; error
    /// computation normalizes.
    pub fn set_setpoint(&mut self, heading: f64) {
        self.setpoint = heading;
    }

    #[inline]
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable the loop and clear all state.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.reset();
    }

    /// Clear the accumulator and output. The cached error is only cleared
    /// while disabled — an enabled loop keeps it for coarse/fine steering
    /// decisions made between calculate calls.
    pub fn reset(&mut self) {
        if !self.enabled {
            self.error = 0.0;
        }
        self.total_error = 0.0;
        self.output = 0.0;
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn gains(&self) -> LoopGains {
        self.gains
    }

    pub fn set_gains(&mut self, gains: LoopGains) {
        self.gains = gains;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
