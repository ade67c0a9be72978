//! Software implementations of the hardware seams.
//!
//! Each sim device is a cheap `Clone` sharing interior state, so a test can
//! hand one handle to the drivetrain and keep another to poke sensor values
//! and observe actuator output.

use std::cell::Cell;
use std::rc::Rc;

use crate::device::{Actuator, Encoder, Gyro, HalError};
use crate::input::{OperatorInput, StickPosition};

// ─── Actuator ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ActuatorState {
    command: Cell<f64>,
    inverted: Cell<bool>,
}

/// Simulated speed controller.
#[derive(Clone, Debug, Default)]
pub struct SimActuator {
    state: Rc<ActuatorState>,
}

impl SimActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fraction applied to the (virtual) motor, inversion included.
    pub fn applied(&self) -> f64 {
        if self.state.inverted.get() {
            -self.state.command.get()
        } else {
            self.state.command.get()
        }
    }
}

impl Actuator for SimActuator {
    fn set(&mut self, fraction: f64) {
        self.state.command.set(fraction.clamp(-1.0, 1.0));
    }

    fn get(&self) -> f64 {
        self.state.command.get()
    }

    fn set_inverted(&mut self, inverted: bool) {
        self.state.inverted.set(inverted);
    }
}

// ─── Encoder ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct EncoderState {
    raw: Cell<i32>,
    rate: Cell<f64>,
    zero: Cell<i32>,
    inverted: Cell<bool>,
}

/// Simulated encoder with test-settable position and rate.
#[derive(Clone, Debug, Default)]
pub struct SimEncoder {
    state: Rc<EncoderState>,
}

impl SimEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw (pre-inversion, pre-zero) count.
    pub fn set_counts(&self, counts: i32) {
        self.state.raw.set(counts);
    }

    /// Set the raw rate in counts/second.
    pub fn set_rate(&self, rate: f64) {
        self.state.rate.set(rate);
    }

    fn oriented_raw(&self) -> i32 {
        if self.state.inverted.get() {
            -self.state.raw.get()
        } else {
            self.state.raw.get()
        }
    }
}

impl Encoder for SimEncoder {
    fn get(&self) -> i32 {
        self.oriented_raw() - self.state.zero.get()
    }

    fn rate(&self) -> f64 {
        if self.state.inverted.get() {
            -self.state.rate.get()
        } else {
            self.state.rate.get()
        }
    }

    fn reset(&mut self) {
        self.state.zero.set(self.oriented_raw());
    }

    fn set_inverted(&mut self, inverted: bool) {
        self.state.inverted.set(inverted);
    }
}

// ─── Gyro ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct GyroState {
    angle: Cell<f64>,
    rate: Cell<f64>,
}

/// Simulated gyro with test-settable angle and rate.
#[derive(Clone, Debug, Default)]
pub struct SimGyro {
    state: Rc<GyroState>,
}

impl SimGyro {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw accumulated angle in degrees.
    pub fn set_angle(&self, degrees: f64) {
        self.state.angle.set(degrees);
    }

    /// Set the angular velocity in degrees/second.
    pub fn set_rate(&self, rate: f64) {
        self.state.rate.set(rate);
    }
}

impl Gyro for SimGyro {
    fn angle(&self) -> f64 {
        self.state.angle.get()
    }

    fn rate(&self) -> f64 {
        self.state.rate.get()
    }

    fn calibrate(&mut self) -> Result<(), HalError> {
        // Nothing to calibrate in software.
        Ok(())
    }
}

// ─── Operator input ─────────────────────────────────────────────────

#[derive(Debug, Default)]
struct InputState {
    left: Cell<StickPosition>,
    right: Cell<StickPosition>,
    pending_cancel: Cell<bool>,
    pending_reset: Cell<bool>,
    pending_toggle: Cell<bool>,
    rotate_target: Cell<Option<f64>>,
}

/// Scripted operator input for tests and headless autonomous runs.
///
/// `press_*` calls queue a press that is delivered by the next
/// [`OperatorInput::poll`] and reported for exactly that one tick, the
/// same shape a real edge-detected gamepad press has.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    state: Rc<InputState>,
    cancel: bool,
    reset_heading: bool,
    toggle_speed_pids: bool,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sticks(&self, left: StickPosition, right: StickPosition) {
        self.state.left.set(left);
        self.state.right.set(right);
    }

    pub fn press_cancel(&self) {
        self.state.pending_cancel.set(true);
    }

    pub fn press_reset_heading(&self) {
        self.state.pending_reset.set(true);
    }

    pub fn press_toggle_speed_pids(&self) {
        self.state.pending_toggle.set(true);
    }

    pub fn set_rotate_target(&self, heading: Option<f64>) {
        self.state.rotate_target.set(heading);
    }
}

impl OperatorInput for ScriptedInput {
    fn poll(&mut self) {
        self.cancel = self.state.pending_cancel.replace(false);
        self.reset_heading = self.state.pending_reset.replace(false);
        self.toggle_speed_pids = self.state.pending_toggle.replace(false);
    }

    fn left_stick(&self) -> StickPosition {
        self.state.left.get()
    }

    fn right_stick(&self) -> StickPosition {
        self.state.right.get()
    }

    fn cancel_requested(&self) -> bool {
        self.cancel
    }

    fn reset_heading_requested(&self) -> bool {
        self.reset_heading
    }

    fn speed_pid_toggle_pressed(&self) -> bool {
        self.toggle_speed_pids
    }

    fn rotate_target(&self) -> Option<f64> {
        self.state.rotate_target.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_clamps_and_reports_command() {
        let mut act = SimActuator::new();
        act.set(1.7);
        assert_eq!(act.get(), 1.0);
        act.set(-0.25);
        assert_eq!(act.get(), -0.25);
    }

    #[test]
    fn actuator_inversion_flips_applied_output_only() {
        let mut act = SimActuator::new();
        act.set_inverted(true);
        act.set(0.5);
        assert_eq!(act.get(), 0.5);
        assert_eq!(act.applied(), -0.5);
    }

    #[test]
    fn encoder_reset_zeroes_position() {
        let mut enc = SimEncoder::new();
        enc.set_counts(1000);
        assert_eq!(enc.get(), 1000);
        enc.reset();
        assert_eq!(enc.get(), 0);
        enc.set_counts(1250);
        assert_eq!(enc.get(), 250);
    }

    #[test]
    fn encoder_inversion_flips_counts_and_rate() {
        let mut enc = SimEncoder::new();
        enc.set_counts(100);
        enc.set_rate(50.0);
        enc.set_inverted(true);
        assert_eq!(enc.get(), -100);
        assert_eq!(enc.rate(), -50.0);
    }

    #[test]
    fn scripted_press_is_reported_for_one_poll() {
        let mut input = ScriptedInput::new();
        input.poll();
        assert!(!input.cancel_requested());

        input.press_cancel();
        input.poll();
        assert!(input.cancel_requested());

        input.poll();
        assert!(!input.cancel_requested());
    }

    #[test]
    fn clones_share_state() {
        let gyro = SimGyro::new();
        let handle = gyro.clone();
        handle.set_angle(42.0);
        assert_eq!(gyro.angle(), 42.0);
    }
}
