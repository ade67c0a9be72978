//! Tiller Common Library
//!
//! Shared seams for all tiller workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`telemetry`] - Key/value telemetry sink trait and basic sinks
//! - [`util`] - Small numeric helpers shared by control and commands

pub mod config;
pub mod telemetry;
pub mod util;
