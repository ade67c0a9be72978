//! Actuator and sensor traits.
//!
//! These are the boundary contracts the control core depends on. A backend
//! implements them over real motor controllers and sensors; the [`crate::sim`]
//! module implements them in software.

use std::cell::Cell;
use thiserror::Error;
use tracing::warn;

/// Error types for HAL operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Device initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Sensor calibration failed or is unsupported on this device.
    #[error("Calibration failed: {0}")]
    Calibration(String),
}

/// A speed-controlled actuator commanded with a normalized fraction.
///
/// The core never assumes units beyond the fraction: `1.0` is full forward,
/// `-1.0` full reverse. Implementations must clamp out-of-range commands.
pub trait Actuator {
    /// Command the actuator. `fraction` is clamped to [-1.0, 1.0].
    fn set(&mut self, fraction: f64);

    /// The last commanded fraction (after clamping, before inversion).
    fn get(&self) -> f64;

    /// Invert the direction of all subsequent commands.
    fn set_inverted(&mut self, inverted: bool);
}

/// A quadrature (or equivalent) position encoder.
pub trait Encoder {
    /// Signed position in counts since the last [`Encoder::reset`].
    fn get(&self) -> i32;

    /// Rate of change in counts/second.
    fn rate(&self) -> f64;

    /// Zero the position at the current location.
    fn reset(&mut self);

    /// Invert the counting direction.
    fn set_inverted(&mut self, inverted: bool);
}

/// An orientation sensor producing a continuous angle.
///
/// The raw angle is unbounded (multiple turns accumulate); normalization
/// into [0, 360) is the heading tracker's job, not the sensor's.
pub trait Gyro {
    /// Raw accumulated angle in degrees.
    fn angle(&self) -> f64;

    /// Angular velocity in degrees/second.
    fn rate(&self) -> f64;

    /// Run the sensor's calibration routine. The robot must be at rest.
    fn calibrate(&mut self) -> Result<(), HalError>;
}

/// Gyro decorator that suppresses single-sample spikes.
///
/// A reading that jumps more than 360 degrees from the previous reading
/// cannot be a physical rotation at the rates this system samples at, so
/// the previous good value is substituted for that one sample. The raw
/// reading still becomes the comparison point for the next sample, which
/// lets a genuine (if implausible) new baseline take over after one tick
/// while a transient fault never reaches the heading loop.
pub struct FilteredGyro<G: Gyro> {
    inner: G,
    last_raw: Cell<Option<f64>>,
    last_good: Cell<f64>,
}

impl<G: Gyro> FilteredGyro<G> {
    /// Maximum believable sample-to-sample angle change, in degrees.
    const MAX_SAMPLE_DELTA: f64 = 360.0;

    pub fn new(inner: G) -> Self {
        Self {
            inner,
            last_raw: Cell::new(None),
            last_good: Cell::new(0.0),
        }
    }
}

impl<G: Gyro> Gyro for FilteredGyro<G> {
    fn angle(&self) -> f64 {
        let raw = self.inner.angle();

        let accepted = match self.last_raw.get() {
            Some(prev) if (raw - prev).abs() > Self::MAX_SAMPLE_DELTA => {
                warn!(
                    "gyro spike suppressed: raw {:.1} vs previous {:.1}",
                    raw, prev
                );
                self.last_good.get()
            }
            _ => raw,
        };

        self.last_raw.set(Some(raw));
        self.last_good.set(accepted);
        accepted
    }

    fn rate(&self) -> f64 {
        self.inner.rate()
    }

    fn calibrate(&mut self) -> Result<(), HalError> {
        self.inner.calibrate()
    }
}
