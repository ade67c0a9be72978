//! Single-threaded cooperative scheduler.
//!
//! Each tick advances every active top-level command exactly once, in
//! registration order:
//!
//! 1. Cancellations requested since the last tick are honored first
//!    (`end` runs before anything else can claim the subsystem).
//! 2. Newly scheduled commands are admitted. Admission evicts any active
//!    command with an overlapping claim set — newest wins, and the evicted
//!    command's `end` runs before the new command's `init`.
//! 3. Every active command is advanced: `init` on its first tick, then
//!    `execute`, then the finish checks (cancel, timeout, predicate).
//!    Finishing by any route runs `end` exactly once.
//! 4. Default commands are re-queued for any registered claim set that is
//!    no longer held, so standing behavior (teleop drive) resumes the tick
//!    after a one-shot command releases its subsystem.
//!
//! Subsystem periodic updates (PID math, telemetry) are the application
//! loop's job and run after `tick` returns, so a command's `execute`
//! always observes the previous tick's control-loop outputs.

use std::time::Instant;

use heapless::Vec as FixedVec;
use tracing::{debug, info, warn};

use crate::claim::ClaimSet;
use crate::command::Command;

/// Upper bound on concurrently active top-level commands.
///
/// The active list is the claim table; a robot with more simultaneous
/// top-level behaviors than this has a design problem, not a capacity
/// problem.
pub const MAX_ACTIVE: usize = 16;

/// Upper bound on commands scheduled between two ticks.
pub const MAX_QUEUED: usize = 16;

/// Handle for cancelling or querying a scheduled command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Admitted, `init` not yet called.
    Pending,
    /// `init` has run; advancing every tick.
    Running,
}

struct ActiveEntry<C> {
    id: CommandId,
    command: Box<dyn Command<C>>,
    state: RunState,
    started_at: Option<Instant>,
    cancel_requested: bool,
}

struct QueuedEntry<C> {
    id: CommandId,
    command: Box<dyn Command<C>>,
}

struct DefaultSlot<C> {
    claims: ClaimSet,
    factory: Box<dyn FnMut() -> Box<dyn Command<C>>>,
}

pub struct Scheduler<C> {
    active: FixedVec<ActiveEntry<C>, MAX_ACTIVE>,
    queue: FixedVec<QueuedEntry<C>, MAX_QUEUED>,
    defaults: Vec<DefaultSlot<C>>,
    next_id: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            active: FixedVec::new(),
            queue: FixedVec::new(),
            defaults: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule a command to start on the next tick.
    ///
    /// Returns `None` (dropping the command with a warning) when the
    /// between-tick queue is full.
    pub fn schedule(&mut self, command: Box<dyn Command<C>>) -> Option<CommandId> {
        let id = CommandId(self.next_id);
        self.next_id += 1;

        debug!("scheduling command '{}'", command.name());
        match self.queue.push(QueuedEntry { id, command }) {
            Ok(()) => Some(id),
            Err(entry) => {
                warn!(
                    "command queue full ({MAX_QUEUED}), dropping '{}'",
                    entry.command.name()
                );
                None
            }
        }
    }

    /// Register a standing default command for `claims`.
    ///
    /// Whenever no active or queued command holds any bit of `claims`, the
    /// factory is invoked and its command scheduled. The default is
    /// evicted like any other command when a conflicting one starts, and
    /// comes back once the claim frees up.
    pub fn set_default(
        &mut self,
        claims: ClaimSet,
        factory: impl FnMut() -> Box<dyn Command<C>> + 'static,
    ) {
        self.defaults.push(DefaultSlot {
            claims,
            factory: Box::new(factory),
        });
    }

    /// Request cancellation of a command.
    ///
    /// Takes effect on the next tick, before any new command's `init`: a
    /// running command gets its `end` called; a command that never reached
    /// `init` is discarded without one.
    pub fn cancel(&mut self, id: CommandId) {
        if let Some(entry) = self.active.iter_mut().find(|entry| entry.id == id) {
            entry.cancel_requested = true;
        } else {
            // Still queued: drop it before it ever starts.
            if let Some(pos) = self.queue.iter().position(|entry| entry.id == id) {
                let entry = self.queue.remove(pos);
                debug!("cancelled queued command '{}'", entry.command.name());
            }
        }
    }

    /// Whether the command is still queued or active.
    pub fn is_running(&self, id: CommandId) -> bool {
        self.active.iter().any(|entry| entry.id == id)
            || self.queue.iter().any(|entry| entry.id == id)
    }

    /// Union of all claims held by active commands.
    pub fn claimed(&self) -> ClaimSet {
        self.active
            .iter()
            .fold(ClaimSet::empty(), |set, entry| set | entry.command.claims())
    }

    /// Number of active (admitted) commands.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Advance one tick using the current wall clock.
    pub fn tick(&mut self, ctx: &mut C) {
        self.tick_at(ctx, Instant::now());
    }

    /// Advance one tick, evaluating timeouts against `now`.
    pub fn tick_at(&mut self, ctx: &mut C, now: Instant) {
        self.finish_cancelled(ctx);
        self.admit_queued(ctx);
        self.advance(ctx, now);
        self.queue_defaults();
    }

    /// Cancel everything, running `end` for every command that started.
    ///
    /// Used on shutdown and on robot disable.
    pub fn cancel_all(&mut self, ctx: &mut C) {
        while let Some(mut entry) = self.active.pop() {
            if entry.state == RunState::Running {
                info!("cancelling '{}'", entry.command.name());
                entry.command.end(ctx);
            }
        }
        self.queue.clear();
    }

    // ── Tick phases ─────────────────────────────────────────────────

    fn finish_cancelled(&mut self, ctx: &mut C) {
        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].cancel_requested {
                let mut entry = self.active.remove(index);
                if entry.state == RunState::Running {
                    info!("command '{}' cancelled", entry.command.name());
                    entry.command.end(ctx);
                }
            } else {
                index += 1;
            }
        }
    }

    fn admit_queued(&mut self, ctx: &mut C) {
        while !self.queue.is_empty() {
            let queued = self.queue.remove(0);
            let claims = queued.command.claims();

            // Evict every active claimant of an overlapping subsystem —
            // newest wins. The evicted command's end runs here, strictly
            // before the new command's init.
            let mut index = 0;
            while index < self.active.len() {
                if self.active[index].command.claims().intersects(claims) {
                    let mut evicted = self.active.remove(index);
                    if evicted.state == RunState::Running {
                        info!(
                            "command '{}' interrupted by '{}'",
                            evicted.command.name(),
                            queued.command.name()
                        );
                        evicted.command.end(ctx);
                    }
                } else {
                    index += 1;
                }
            }

            let entry = ActiveEntry {
                id: queued.id,
                command: queued.command,
                state: RunState::Pending,
                started_at: None,
                cancel_requested: false,
            };
            if let Err(entry) = self.active.push(entry) {
                warn!(
                    "active command table full ({MAX_ACTIVE}), dropping '{}'",
                    entry.command.name()
                );
            }
        }
    }

    fn advance(&mut self, ctx: &mut C, now: Instant) {
        let mut index = 0;
        while index < self.active.len() {
            let finished = {
                let entry = &mut self.active[index];

                if entry.state == RunState::Pending {
                    info!("command '{}' starting", entry.command.name());
                    entry.command.init(ctx);
                    entry.started_at = Some(now);
                    entry.state = RunState::Running;
                }

                entry.command.execute(ctx);

                let timed_out = match (entry.command.timeout(), entry.started_at) {
                    (Some(limit), Some(started)) => now.duration_since(started) >= limit,
                    _ => false,
                };
                if timed_out {
                    info!("command '{}' timed out", entry.command.name());
                }

                entry.cancel_requested || timed_out || entry.command.is_finished(ctx)
            };

            if finished {
                let mut entry = self.active.remove(index);
                debug!("command '{}' finished", entry.command.name());
                entry.command.end(ctx);
            } else {
                index += 1;
            }
        }
    }

    fn queue_defaults(&mut self) {
        let held = self.claimed()
            | self
                .queue
                .iter()
                .fold(ClaimSet::empty(), |set, entry| set | entry.command.claims());

        for slot in &mut self.defaults {
            if !slot.claims.intersects(held) {
                let command = (slot.factory)();
                let id = CommandId(self.next_id);
                self.next_id += 1;
                debug!("re-queueing default command '{}'", command.name());
                if self.queue.push(QueuedEntry { id, command }).is_err() {
                    warn!("command queue full, default command not queued");
                }
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
