//! # Tiller Control
//!
//! Closed-loop drive control for a differential (tank-style) chassis:
//!
//! 1. **Control loops** — proportional+integral loops for wheel speed
//!    (feed-forward, output in ±1.0) and heading (shortest-path angular
//!    error), both with back-calculation anti-windup.
//! 2. **Heading tracker** — normalizes a raw gyro into a [0, 360) heading
//!    with inversion and re-zeroing support.
//! 3. **Drive mixer** — pure stick-to-wheel-speed math (arcade, tank,
//!    single-stick) with input/motor deadbands and a response curve.
//! 4. **Drivetrain** — owns the actuator/encoder pairs and the loops,
//!    runs all control math once per tick, and exposes the speed-set,
//!    drive-on-heading, and rotate-to-heading operations.
//!
//! Everything here is deterministic per-tick math over the seams in
//! `tiller_hal`; nothing blocks and nothing allocates in the tick path.

pub mod angles;
pub mod drivetrain;
pub mod heading;
pub mod mixer;
pub mod pid;

pub use drivetrain::{DriveTrain, HeadingMode};
pub use heading::HeadingTracker;
pub use mixer::{DriveMixer, WheelSpeeds};
pub use pid::{HeadingLoop, LoopGains, SpeedLoop};
