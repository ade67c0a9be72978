//! Heading tracker: raw gyro in, [0, 360) heading out.
//!
//! Wraps a [`Gyro`] and produces the normalized robot heading with
//! inversion and re-zeroing support. The raw sensor angle is unbounded
//! (turns accumulate); every public read lands in [0, 360) and is rounded
//! to three decimal places so comparison logic is not chasing sensor
//! jitter in the micro-degree digits.

use tiller_common::util::round_places;
use tiller_hal::device::{Gyro, HalError};

use crate::angles::normalize_angle;

pub struct HeadingTracker {
    gyro: Box<dyn Gyro>,
    inverted: bool,
    offset: f64,
}

impl HeadingTracker {
    /// Decimal places kept on the public heading.
    const PRECISION: i32 = 3;

    pub fn new(gyro: Box<dyn Gyro>, inverted: bool) -> Self {
        Self {
            gyro,
            inverted,
            offset: 0.0,
        }
    }

    /// Current heading in [0, 360).
    pub fn heading(&self) -> f64 {
        round_places(normalize_angle(self.oriented_angle() + self.offset), Self::PRECISION)
    }

    /// Rotation rate in degrees/second, inversion-adjusted, unclamped.
    pub fn rate(&self) -> f64 {
        if self.inverted {
            -self.gyro.rate()
        } else {
            self.gyro.rate()
        }
    }

    /// Declare the current physical orientation to be `angle` degrees.
    ///
    /// Recomputes the offset so the next [`HeadingTracker::heading`] call
    /// returns exactly `angle` (normalized). Used at match start to load a
    /// known starting orientation, or after a known reorientation.
    pub fn set_heading(&mut self, angle: f64) {
        // Clear the old offset, read the bare heading, then choose the
        // offset that cancels it and lands on the requested angle.
        self.offset = 0.0;
        self.offset = -self.heading();
        self.offset += angle;
    }

    /// Re-zero: declare the current orientation to be heading 0.
    pub fn reset(&mut self) {
        self.set_heading(0.0);
    }

    /// Run the underlying sensor's calibration. The robot must be at rest.
    pub fn calibrate(&mut self) -> Result<(), HalError> {
        self.gyro.calibrate()
    }

    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    fn oriented_angle(&self) -> f64 {
        if self.inverted {
            -self.gyro.angle()
        } else {
            self.gyro.angle()
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
