//! Fixed-rate tick pacing.
//!
//! The robot runs everything from one periodic tick (20 ms nominal).
//! Two pacing strategies share the same loop body:
//!
//! - default build: `std::thread::sleep` for the remainder of the period
//!   — fine for simulation and bench work;
//! - `rt` feature: `clock_nanosleep(TIMER_ABSTIME)` against
//!   `CLOCK_MONOTONIC` with an absolute next-wake time, so periods do not
//!   drift with body execution time.
//!
//! Overruns are counted and logged, never fatal: a competition robot that
//! misses a deadline must keep driving.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::warn;

/// O(1) per-tick timing statistics, updated with no allocation.
#[derive(Debug, Clone)]
pub struct TickStats {
    /// Total ticks executed.
    pub tick_count: u64,
    /// Last tick body duration [µs].
    pub last_tick_us: u64,
    /// Minimum tick body duration [µs].
    pub min_tick_us: u64,
    /// Maximum tick body duration [µs].
    pub max_tick_us: u64,
    /// Running sum for average computation.
    pub sum_tick_us: u64,
    /// Ticks whose body exceeded the period.
    pub overruns: u64,
}

impl TickStats {
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            last_tick_us: 0,
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            sum_tick_us: 0,
            overruns: 0,
        }
    }

    /// Record one tick body duration.
    #[inline]
    pub fn record(&mut self, duration_us: u64) {
        self.tick_count += 1;
        self.last_tick_us = duration_us;
        if duration_us < self.min_tick_us {
            self.min_tick_us = duration_us;
        }
        if duration_us > self.max_tick_us {
            self.max_tick_us = duration_us;
        }
        self.sum_tick_us += duration_us;
    }

    /// Average tick body duration [µs] (0 before the first tick).
    #[inline]
    pub fn avg_tick_us(&self) -> u64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_tick_us / self.tick_count
        }
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-period driver for the robot loop.
pub struct TickLoop {
    period: Duration,
    stats: TickStats,
}

impl TickLoop {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            stats: TickStats::new(),
        }
    }

    #[inline]
    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run `body` once per period until `running` clears or `body`
    /// returns `false`.
    pub fn run(&mut self, running: &Arc<AtomicBool>, mut body: impl FnMut(u64) -> bool) {
        #[cfg(feature = "rt")]
        {
            self.run_rt(running, &mut body);
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_std(running, &mut body);
        }
    }

    fn record_tick(&mut self, elapsed: Duration) {
        let duration_us = elapsed.as_micros() as u64;
        self.stats.record(duration_us);

        if elapsed > self.period {
            self.stats.overruns += 1;
            warn!(
                "tick overrun: {}µs > {}µs budget",
                duration_us,
                self.period.as_micros()
            );
        }
    }

    /// Relative-sleep pacing.
    #[cfg(not(feature = "rt"))]
    fn run_std(&mut self, running: &Arc<AtomicBool>, body: &mut impl FnMut(u64) -> bool) {
        while running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            if !body(self.stats.tick_count) {
                break;
            }

            let elapsed = tick_start.elapsed();
            self.record_tick(elapsed);

            if let Some(remaining) = self.period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
    }

    /// Absolute-time pacing on CLOCK_MONOTONIC — no drift accumulation.
    #[cfg(feature = "rt")]
    fn run_rt(&mut self, running: &Arc<AtomicBool>, body: &mut impl FnMut(u64) -> bool) {
        use nix::sys::time::TimeSpec;
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let period_ns = self.period.as_nanos() as i64;

        let Ok(mut next_wake) = clock_gettime(clock) else {
            warn!("clock_gettime failed, falling back to relative sleep");
            return self.run_std_fallback(running, body);
        };

        while running.load(Ordering::SeqCst) {
            next_wake = timespec_add_ns(next_wake, period_ns);

            let tick_start = Instant::now();

            if !body(self.stats.tick_count) {
                break;
            }

            self.record_tick(tick_start.elapsed());

            // Sleep until the absolute tick boundary; EINTR wakes early,
            // which only means the next tick starts marginally sooner.
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }

        fn timespec_add_ns(ts: TimeSpec, ns: i64) -> TimeSpec {
            let mut secs = ts.tv_sec();
            let mut nanos = ts.tv_nsec() + ns;
            while nanos >= 1_000_000_000 {
                secs += 1;
                nanos -= 1_000_000_000;
            }
            TimeSpec::new(secs, nanos)
        }
    }

    #[cfg(feature = "rt")]
    fn run_std_fallback(&mut self, running: &Arc<AtomicBool>, body: &mut impl FnMut(u64) -> bool) {
        while running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            if !body(self.stats.tick_count) {
                break;
            }

            let elapsed = tick_start.elapsed();
            self.record_tick(elapsed);

            if let Some(remaining) = self.period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
