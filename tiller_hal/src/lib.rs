//! # Tiller HAL
//!
//! Hardware seams for the tiller robot: actuators, encoders, gyros, and
//! operator input are consumed through the traits in this crate, enabling
//! pluggable backends (simulation for tests and bench work, real drivers
//! on the robot).
//!
//! The control core never talks to hardware directly; everything it reads
//! or writes crosses one of these traits.

pub mod device;
pub mod input;
pub mod sim;

pub use device::{Actuator, Encoder, FilteredGyro, Gyro, HalError};
pub use input::{
    Buttons, GamepadSource, GamepadState, InputMap, MappedGamepad, OperatorInput, StickPosition,
};
