//! The command lifecycle trait.

use std::time::Duration;

use crate::claim::ClaimSet;

/// One unit of cooperative, time-bounded robot behavior.
///
/// A command moves through three states: constructed (pending), running
/// (after `init`), finished (after `is_finished` reports true, a timeout
/// expires, or it is cancelled). The scheduler drives the lifecycle:
///
/// 1. `init` — exactly once per run, on the tick the command starts.
/// 2. `execute` — once per tick while running, starting on the init tick.
/// 3. `is_finished` — polled after each `execute`.
/// 4. `end` — exactly once per run, on **every** exit path: natural
///    completion, timeout, and cancellation alike. This is the resource
///    safety guarantee — motors must always be told to brake or coast on
///    exit, so cleanup lives in `end` and nowhere else.
///
/// `C` is the application context (subsystems, operator input, telemetry)
/// passed by the scheduler into every lifecycle call. Commands hold no
/// subsystem references of their own; everything flows through `C`.
///
/// `execute` must return promptly — no sleeps, no spin-waits. A command
/// that needs to wait expresses it by returning `false` from
/// `is_finished` and being re-polled next tick.
pub trait Command<C> {
    /// Diagnostic name, used in scheduler logs.
    fn name(&self) -> &str;

    /// Subsystems this command exclusively claims while running.
    ///
    /// The scheduler cancels any running claimant before starting a new
    /// command with an overlapping claim set. A command that mutates a
    /// subsystem without claiming it violates the model.
    fn claims(&self) -> ClaimSet {
        ClaimSet::empty()
    }

    /// Wall-clock limit measured from `init`; `None` runs until another
    /// completion condition or an external cancel.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Called exactly once when the command starts. Read sensor state
    /// here, not in the constructor — groups construct their commands
    /// long before they run.
    fn init(&mut self, ctx: &mut C) {
        let _ = ctx;
    }

    /// Called once per tick while running.
    fn execute(&mut self, ctx: &mut C) {
        let _ = ctx;
    }

    /// Completion predicate, polled after each `execute`.
    fn is_finished(&mut self, ctx: &mut C) -> bool;

    /// Called exactly once when the command stops, on every exit path.
    fn end(&mut self, ctx: &mut C) {
        let _ = ctx;
    }
}
