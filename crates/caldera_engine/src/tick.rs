//! # Tick Loop
//!
//! Fixed-rate driver for the scheduling thread.
//!
//! The engine itself never looks at the wall clock; every duration is a tick
//! count. `TickLoop` is what turns ticks into real time for a host that has
//! no scheduler of its own (the headless server, soak tests).

use std::time::{Duration, Instant};

use tracing::warn;

/// Lag after which the loop drops the backlog instead of catching up.
const MAX_BACKLOG_TICKS: u32 = 10;

/// Timing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickStats {
    /// Shortest tick body, microseconds.
    pub min_tick_us: u64,
    /// Longest tick body, microseconds.
    pub max_tick_us: u64,
    /// Rolling average of tick bodies, microseconds.
    pub avg_tick_us: u64,
    /// Ticks whose body ran over the tick budget.
    pub late_ticks: u64,
    /// Ticks measured.
    pub total_ticks: u64,
    /// Times the backlog was dropped.
    pub skipped_backlogs: u64,
}

impl TickStats {
    fn fresh(budget: Duration) -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: micros(budget),
            late_ticks: 0,
            total_ticks: 0,
            skipped_backlogs: 0,
        }
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Fixed-timestep loop.
#[derive(Debug)]
pub struct TickLoop {
    tick_duration: Duration,
    last_poll: Instant,
    accumulator: Duration,
    tick_count: u64,
    stats: TickStats,
}

impl TickLoop {
    /// Creates a loop running `tick_rate` ticks per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));
        Self {
            tick_duration,
            last_poll: Instant::now(),
            accumulator: Duration::ZERO,
            tick_count: 0,
            stats: TickStats::fresh(tick_duration),
        }
    }

    /// Returns true if a tick is due.
    ///
    /// A backlog longer than a few ticks is dropped with a warning; the
    /// session would otherwise fast-forward through its timers.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        self.accumulator += now.duration_since(self.last_poll);
        self.last_poll = now;

        if self.accumulator > self.tick_duration * MAX_BACKLOG_TICKS {
            warn!(
                behind_ms = self.accumulator.as_millis(),
                "Tick loop fell behind, dropping backlog"
            );
            self.accumulator = self.tick_duration;
            self.stats.skipped_backlogs += 1;
        }

        self.accumulator >= self.tick_duration
    }

    /// Marks the start of a tick body.
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.accumulator = self.accumulator.saturating_sub(self.tick_duration);
        self.tick_count += 1;
        Instant::now()
    }

    /// Marks the end of a tick body and records its duration.
    pub fn end_tick(&mut self, start: Instant) {
        let duration = start.elapsed();
        let us = micros(duration);

        self.stats.total_ticks += 1;
        self.stats.min_tick_us = self.stats.min_tick_us.min(us);
        self.stats.max_tick_us = self.stats.max_tick_us.max(us);
        self.stats.avg_tick_us = (self.stats.avg_tick_us * 15 + us) / 16;

        if duration > self.tick_duration {
            self.stats.late_ticks += 1;
        }
    }

    /// Sleeps until the next tick is due.
    pub fn wait_for_next_tick(&self) {
        let pending = self.accumulator + self.last_poll.elapsed();
        if pending < self.tick_duration {
            std::thread::sleep(self.tick_duration - pending);
        }
    }

    /// Calls `body` once per tick until it returns false.
    ///
    /// Returns the number of ticks run.
    pub fn run_while(&mut self, mut body: impl FnMut(u64) -> bool) -> u64 {
        let first = self.tick_count;
        loop {
            while self.should_tick() {
                let start = self.begin_tick();
                let keep_going = body(self.tick_count);
                self.end_tick(start);
                if !keep_going {
                    return self.tick_count - first;
                }
            }
            self.wait_for_next_tick();
        }
    }

    /// Ticks executed.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Length of one tick.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Clears the statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::fresh(self.tick_duration);
    }
}

impl Default for TickLoop {
    fn default() -> Self {
        Self::new(20)
    }
}
