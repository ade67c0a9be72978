//! Sequential/parallel command composition.
//!
//! A group is itself a [`Command`]: the scheduler sees one claim set (the
//! union of the children's) and one lifecycle, while the group drives its
//! children internally, one sequential boundary at a time.
//!
//! Entries appended with [`CommandGroup::add_parallel`] start alongside
//! the next sequential entry and run concurrently with it — but only
//! until that sequential entry finishes. At the boundary, any parallel
//! entry from the span that is still running is cancelled (its `end`
//! runs) before the group moves on. Parallel entries appended after the
//! last sequential entry run the group to completion of all of them.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::claim::ClaimSet;
use crate::command::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecOrder {
    /// The group waits for this entry before advancing.
    Sequential,
    /// Runs alongside the next sequential entry.
    Parallel,
}

struct Entry<C> {
    order: ExecOrder,
    command: Box<dyn Command<C>>,
}

struct ActiveChild {
    /// Index into `entries`.
    index: usize,
    initialized: bool,
    started_at: Option<Instant>,
    finished: bool,
}

pub struct CommandGroup<C> {
    name: String,
    entries: Vec<Entry<C>>,
    timeout: Option<Duration>,
    /// Next entry not yet admitted to a cohort.
    cursor: usize,
    /// Children of the current span: parallels plus at most one anchor.
    cohort: Vec<ActiveChild>,
    /// Index (into `cohort`) of the sequential anchor, if the span has one.
    anchor: Option<usize>,
}

impl<C> CommandGroup<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            timeout: None,
            cursor: 0,
            cohort: Vec::new(),
            anchor: None,
        }
    }

    /// Append an entry the group waits for before moving on.
    pub fn add_sequential(mut self, command: Box<dyn Command<C>>) -> Self {
        self.entries.push(Entry {
            order: ExecOrder::Sequential,
            command,
        });
        self
    }

    /// Append an entry that runs alongside the next sequential entry.
    pub fn add_parallel(mut self, command: Box<dyn Command<C>>) -> Self {
        self.entries.push(Entry {
            order: ExecOrder::Parallel,
            command,
        });
        self
    }

    /// Bound the whole group's runtime.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Admit the next span: every parallel entry up to and including the
    /// next sequential entry, or all trailing parallels.
    fn admit_next_span(&mut self) {
        debug_assert!(self.cohort.is_empty());
        self.anchor = None;

        while self.cursor < self.entries.len() {
            let order = self.entries[self.cursor].order;
            self.cohort.push(ActiveChild {
                index: self.cursor,
                initialized: false,
                started_at: None,
                finished: false,
            });
            self.cursor += 1;

            if order == ExecOrder::Sequential {
                self.anchor = Some(self.cohort.len() - 1);
                break;
            }
        }
    }

    /// Advance every unfinished child of the current cohort one step.
    fn step_cohort(&mut self, ctx: &mut C) {
        let now = Instant::now();

        for child in &mut self.cohort {
            if child.finished {
                continue;
            }

            let entry = &mut self.entries[child.index];

            if !child.initialized {
                debug!("group '{}' starting child '{}'", self.name, entry.command.name());
                entry.command.init(ctx);
                child.started_at = Some(now);
                child.initialized = true;
            }

            entry.command.execute(ctx);

            let timed_out = match (entry.command.timeout(), child.started_at) {
                (Some(limit), Some(started)) => now.duration_since(started) >= limit,
                _ => false,
            };
            if timed_out {
                info!(
                    "group '{}' child '{}' timed out",
                    self.name,
                    entry.command.name()
                );
            }

            if timed_out || entry.command.is_finished(ctx) {
                entry.command.end(ctx);
                child.finished = true;
            }
        }
    }

    /// True when the current span is complete: the anchor finished (still
    /// running parallels get cancelled), or — with no anchor — every
    /// trailing parallel finished.
    fn close_span_if_done(&mut self, ctx: &mut C) {
        let done = match self.anchor {
            Some(anchor) => self.cohort[anchor].finished,
            None => self.cohort.iter().all(|child| child.finished),
        };

        if !done {
            return;
        }

        for child in &mut self.cohort {
            if !child.finished {
                let entry = &mut self.entries[child.index];
                info!(
                    "group '{}' cancelling parallel child '{}' at boundary",
                    self.name,
                    entry.command.name()
                );
                entry.command.end(ctx);
                child.finished = true;
            }
        }
        self.cohort.clear();
        self.anchor = None;
    }
}

impl<C> Command<C> for CommandGroup<C> {
    fn name(&self) -> &str {
        &self.name
    }

    /// A group claims everything any child claims, for its whole run.
    fn claims(&self) -> ClaimSet {
        self.entries
            .iter()
            .fold(ClaimSet::empty(), |set, entry| set | entry.command.claims())
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn init(&mut self, _ctx: &mut C) {
        self.cursor = 0;
        self.cohort.clear();
        self.anchor = None;
    }

    fn execute(&mut self, ctx: &mut C) {
        if self.cohort.is_empty() {
            if self.cursor >= self.entries.len() {
                return;
            }
            self.admit_next_span();
        }

        self.step_cohort(ctx);
        self.close_span_if_done(ctx);
    }

    fn is_finished(&mut self, _ctx: &mut C) -> bool {
        self.cursor >= self.entries.len() && self.cohort.is_empty()
    }

    /// Cancelling the group cancels every still-running child.
    fn end(&mut self, ctx: &mut C) {
        for child in &mut self.cohort {
            if child.initialized && !child.finished {
                let entry = &mut self.entries[child.index];
                info!(
                    "group '{}' cancelling child '{}'",
                    self.name,
                    entry.command.name()
                );
                entry.command.end(ctx);
                child.finished = true;
            }
        }
        self.cohort.clear();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: String,
        log: Log,
        timeout: Option<Duration>,
        finish_after: Option<u32>,
        executed: u32,
    }

    impl Probe {
        fn new(name: &str, log: &Log) -> Self {
            Self {
                name: name.to_string(),
                log: log.clone(),
                timeout: None,
                finish_after: None,
                executed: 0,
            }
        }

        fn finishing_after(mut self, executes: u32) -> Self {
            self.finish_after = Some(executes);
            self
        }

        fn timing_out(mut self, timeout: Duration) -> Self {
            self.timeout = Some(timeout);
            self
        }

        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{}:{event}", self.name));
        }
    }

    impl Command<()> for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        fn timeout(&self) -> Option<Duration> {
            self.timeout
        }

        fn init(&mut self, _ctx: &mut ()) {
            self.record("init");
        }

        fn execute(&mut self, _ctx: &mut ()) {
            self.executed += 1;
            self.record("execute");
        }

        fn is_finished(&mut self, _ctx: &mut ()) -> bool {
            self.finish_after
                .is_some_and(|after| self.executed >= after)
        }

        fn end(&mut self, _ctx: &mut ()) {
            self.record("end");
        }
    }

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn events(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    fn run_group(group: CommandGroup<()>, max_ticks: u32) -> (bool, u32) {
        let mut group = group;
        group.init(&mut ());
        for tick in 1..=max_ticks {
            group.execute(&mut ());
            if group.is_finished(&mut ()) {
                return (true, tick);
            }
        }
        (false, max_ticks)
    }

    #[test]
    fn sequential_entries_run_one_at_a_time() {
        let log = log();
        let group = CommandGroup::new("auto")
            .add_sequential(Box::new(Probe::new("a", &log).finishing_after(1)))
            .add_sequential(Box::new(Probe::new("b", &log).finishing_after(1)));

        let (finished, ticks) = run_group(group, 10);
        assert!(finished);
        assert_eq!(ticks, 2);
        assert_eq!(
            events(&log),
            ["a:init", "a:execute", "a:end", "b:init", "b:execute", "b:end"]
        );
    }

    #[test]
    fn parallel_runs_alongside_sequential_anchor() {
        let log = log();
        let group = CommandGroup::new("auto")
            .add_parallel(Box::new(Probe::new("x", &log).finishing_after(10)))
            .add_sequential(Box::new(Probe::new("y", &log).finishing_after(2)));

        let (finished, ticks) = run_group(group, 10);
        assert!(finished);
        assert_eq!(ticks, 2);

        let all = events(&log);
        // Both started on the first tick, x registered first.
        assert_eq!(all[0], "x:init");
        assert_eq!(all[2], "y:init");
        // y finished naturally; x was still running and got cancelled at
        // the boundary — after y's end, before the group reported done.
        let y_end = all.iter().position(|e| e == "y:end").unwrap();
        let x_end = all.iter().position(|e| e == "x:end").unwrap();
        assert!(y_end < x_end, "anchor ends before parallels cancel: {all:?}");
        assert_eq!(all.iter().filter(|e| *e == "x:end").count(), 1);
    }

    #[test]
    fn parallel_finishing_early_is_not_cancelled_twice() {
        let log = log();
        let group = CommandGroup::new("auto")
            .add_parallel(Box::new(Probe::new("x", &log).finishing_after(1)))
            .add_sequential(Box::new(Probe::new("y", &log).finishing_after(3)));

        let (finished, _) = run_group(group, 10);
        assert!(finished);

        let all = events(&log);
        assert_eq!(all.iter().filter(|e| *e == "x:end").count(), 1);
        assert_eq!(all.iter().filter(|e| *e == "y:end").count(), 1);
    }

    #[test]
    fn parallels_span_only_until_their_boundary() {
        let log = log();
        let group = CommandGroup::new("auto")
            .add_parallel(Box::new(Probe::new("x", &log).finishing_after(100)))
            .add_sequential(Box::new(Probe::new("y", &log).finishing_after(1)))
            .add_sequential(Box::new(Probe::new("z", &log).finishing_after(1)));

        let (finished, _) = run_group(group, 10);
        assert!(finished);

        let all = events(&log);
        // x must be cancelled when y (its boundary) finishes, before z starts.
        let x_end = all.iter().position(|e| e == "x:end").unwrap();
        let z_init = all.iter().position(|e| e == "z:init").unwrap();
        assert!(x_end < z_init, "parallel must not outlive its span: {all:?}");
    }

    #[test]
    fn trailing_parallels_all_complete() {
        let log = log();
        let group = CommandGroup::new("auto")
            .add_sequential(Box::new(Probe::new("a", &log).finishing_after(1)))
            .add_parallel(Box::new(Probe::new("p1", &log).finishing_after(1)))
            .add_parallel(Box::new(Probe::new("p2", &log).finishing_after(2)));

        let (finished, ticks) = run_group(group, 10);
        assert!(finished);
        // Tick 1: a. Tick 2: p1 done, p2 running. Tick 3: p2 done.
        assert_eq!(ticks, 3);

        let all = events(&log);
        assert!(all.contains(&"p1:end".to_string()));
        assert!(all.contains(&"p2:end".to_string()));
    }

    #[test]
    fn child_timeout_ends_the_child() {
        let log = log();
        let group = CommandGroup::new("auto")
            .add_sequential(Box::new(
                Probe::new("stuck", &log).timing_out(Duration::ZERO),
            ))
            .add_sequential(Box::new(Probe::new("next", &log).finishing_after(1)));

        let (finished, _) = run_group(group, 10);
        assert!(finished);

        let all = events(&log);
        let stuck_end = all.iter().position(|e| e == "stuck:end").unwrap();
        let next_init = all.iter().position(|e| e == "next:init").unwrap();
        assert!(stuck_end < next_init);
    }

    #[test]
    fn cancelling_the_group_cancels_running_children() {
        let log = log();
        let mut group = CommandGroup::new("auto")
            .add_parallel(Box::new(Probe::new("x", &log).finishing_after(100)))
            .add_sequential(Box::new(Probe::new("y", &log).finishing_after(100)));

        group.init(&mut ());
        group.execute(&mut ());
        assert!(!group.is_finished(&mut ()));

        group.end(&mut ());

        let all = events(&log);
        assert_eq!(all.iter().filter(|e| *e == "x:end").count(), 1);
        assert_eq!(all.iter().filter(|e| *e == "y:end").count(), 1);
    }

    #[test]
    fn empty_group_finishes_immediately() {
        let group: CommandGroup<()> = CommandGroup::new("empty");
        let (finished, ticks) = run_group(group, 1);
        assert!(finished);
        assert_eq!(ticks, 1);
    }

    #[test]
    fn group_runs_under_the_scheduler() {
        let log = log();
        let group = CommandGroup::new("auto")
            .add_sequential(Box::new(Probe::new("a", &log).finishing_after(1)))
            .add_sequential(Box::new(Probe::new("b", &log).finishing_after(1)));

        let mut scheduler: Scheduler<()> = Scheduler::new();
        let id = scheduler.schedule(Box::new(group)).unwrap();

        let t0 = Instant::now();
        for n in 0u32..5 {
            scheduler.tick_at(&mut (), t0 + n * Duration::from_millis(20));
        }

        assert!(!scheduler.is_running(id));
        let all = events(&log);
        assert!(all.contains(&"a:end".to_string()));
        assert!(all.contains(&"b:end".to_string()));
    }
}
