//! # Tiller Command
//!
//! The cooperative task core: single-purpose control actions (drive,
//! rotate, wait-for-sensor) composed into time-bounded, cancellable,
//! sequential/parallel behaviors.
//!
//! Everything runs on one logical thread under a fixed periodic tick.
//! "Concurrency" is cooperative interleaving: a command never blocks the
//! tick — all waiting is an [`Command::is_finished`] returning `false`
//! and being re-polled next tick.
//!
//! - [`Command`] — init/execute/is_finished/end lifecycle over a generic
//!   application context, with a claim set and an optional timeout.
//! - [`Scheduler`] — advances every active top-level command exactly once
//!   per tick in registration order, enforces exclusive subsystem claims
//!   (newest claimant wins), and guarantees `end` runs on every exit path.
//! - [`CommandGroup`] — sequential/parallel composition with boundary
//!   cancellation of still-running parallel entries.

pub mod claim;
pub mod command;
pub mod group;
pub mod scheduler;
pub mod wait;

pub use claim::ClaimSet;
pub use command::Command;
pub use group::CommandGroup;
pub use scheduler::{CommandId, Scheduler};
pub use wait::WaitCommand;
