//! # Scheduled Task Runner
//!
//! One-shot and periodic tasks over a context `C`, driven one tick at a time.
//!
//! ## Gating
//!
//! Before any task runs, the scheduler asks the context whether it is still
//! live (`Gate::is_live`). A task that comes due while the gate is closed is
//! dropped without running. Tasks therefore never need their own "is the
//! session still going" check.
//!
//! ## Timing
//!
//! `schedule_once(delay)` runs on the first tick at least `delay` ticks
//! ahead, and never on the tick that scheduled it. A periodic task then runs
//! every `period` ticks until it returns `TaskControl::Cancel` or is
//! cancelled by handle.

use tracing::trace;

/// Liveness predicate of a scheduler context.
pub trait Gate {
    /// Returns true while tasks may run.
    fn is_live(&self) -> bool;
}

/// What a task wants after running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskControl {
    /// Keep the task scheduled (one-shot tasks are removed anyway).
    Continue,
    /// Remove the task.
    Cancel,
}

/// A unit of scheduled work.
pub trait Task<C> {
    /// Runs the task once.
    fn run(&mut self, ctx: &mut C) -> TaskControl;
}

impl<C, F> Task<C> for F
where
    F: FnMut(&mut C) -> TaskControl,
{
    fn run(&mut self, ctx: &mut C) -> TaskControl {
        self(ctx)
    }
}

/// Receives countdown progress.
pub trait CountdownListener<C> {
    /// One step of the countdown, with `remaining` steps left (never 0).
    fn on_tick(&mut self, ctx: &mut C, remaining: u32);

    /// The countdown reached zero.
    fn on_finish(&mut self, ctx: &mut C);
}

/// A countdown task: `on_tick(n)`, `on_tick(n - 1)`, ..., `on_tick(1)`,
/// then `on_finish()` and cancel. Schedule it periodically; one run is one
/// step.
#[derive(Debug)]
pub struct Countdown<L> {
    remaining: u32,
    listener: L,
}

impl<L> Countdown<L> {
    /// Creates a countdown starting at `from`.
    #[must_use]
    pub const fn new(from: u32, listener: L) -> Self {
        Self {
            remaining: from,
            listener,
        }
    }

    /// Steps left before `on_finish`.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl<C, L: CountdownListener<C>> Task<C> for Countdown<L> {
    fn run(&mut self, ctx: &mut C) -> TaskControl {
        if self.remaining == 0 {
            self.listener.on_finish(ctx);
            return TaskControl::Cancel;
        }
        self.listener.on_tick(ctx, self.remaining);
        self.remaining -= 1;
        TaskControl::Continue
    }
}

/// Handle of a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(u64);

struct Entry<C> {
    handle: TaskHandle,
    name: &'static str,
    due: u64,
    period: Option<u64>,
    task: Box<dyn Task<C>>,
}

/// Tick-driven task scheduler.
pub struct Scheduler<C> {
    entries: Vec<Entry<C>>,
    now: u64,
    next_handle: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now)
            .field(
                "tasks",
                &self.entries.iter().map(|e| e.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<C> Scheduler<C> {
    /// Creates an empty scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            now: 0,
            next_handle: 1,
        }
    }

    /// Ticks executed so far.
    #[inline]
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Number of scheduled tasks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is scheduled.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the task is still scheduled.
    #[must_use]
    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Returns true if a task with this name is scheduled.
    #[must_use]
    pub fn has_task(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    fn push(
        &mut self,
        name: &'static str,
        delay: u64,
        period: Option<u64>,
        task: Box<dyn Task<C>>,
    ) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(Entry {
            handle,
            name,
            due: self.now + delay.max(1),
            period: period.map(|p| p.max(1)),
            task,
        });
        trace!(task = name, delay, ?period, "Task scheduled");
        handle
    }

    /// Runs `task` once, `delay` ticks from now.
    pub fn schedule_once<T>(&mut self, name: &'static str, delay: u64, task: T) -> TaskHandle
    where
        T: Task<C> + 'static,
    {
        self.push(name, delay, None, Box::new(task))
    }

    /// Runs `task` `delay` ticks from now, then every `period` ticks.
    pub fn schedule_repeating<T>(
        &mut self,
        name: &'static str,
        delay: u64,
        period: u64,
        task: T,
    ) -> TaskHandle
    where
        T: Task<C> + 'static,
    {
        self.push(name, delay, Some(period), Box::new(task))
    }

    /// Cancels a task. Returns false if it already finished.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        before != self.entries.len()
    }

    /// Cancels every task.
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }
}

impl<C: Gate> Scheduler<C> {
    /// Advances one tick and runs every task that is due, in scheduling
    /// order.
    pub fn tick(&mut self, ctx: &mut C) {
        self.now += 1;
        let now = self.now;

        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].due > now {
                i += 1;
                continue;
            }

            if !ctx.is_live() {
                let entry = self.entries.remove(i);
                trace!(task = entry.name, "Task dropped, context no longer live");
                continue;
            }

            let entry = &mut self.entries[i];
            let control = entry.task.run(ctx);
            match (control, entry.period) {
                (TaskControl::Continue, Some(period)) => {
                    entry.due = now + period;
                    i += 1;
                }
                _ => {
                    let entry = self.entries.remove(i);
                    trace!(task = entry.name, "Task finished");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ctx {
        live: bool,
        log: Vec<String>,
    }

    impl Gate for Ctx {
        fn is_live(&self) -> bool {
            self.live
        }
    }

    fn live() -> Ctx {
        Ctx {
            live: true,
            log: Vec::new(),
        }
    }

    #[test]
    fn test_one_shot_delay() {
        let mut sched = Scheduler::new();
        let mut ctx = live();
        sched.schedule_once("once", 3, |c: &mut Ctx| {
            c.log.push("ran".into());
            TaskControl::Continue
        });

        sched.tick(&mut ctx);
        sched.tick(&mut ctx);
        assert!(ctx.log.is_empty());
        sched.tick(&mut ctx);
        assert_eq!(ctx.log, vec!["ran"]);
        assert!(sched.is_empty());
    }

    #[test]
    fn test_repeating_period_and_self_cancel() {
        let mut sched = Scheduler::new();
        let mut ctx = live();
        let mut runs = 0;
        sched.schedule_repeating("rep", 0, 2, move |c: &mut Ctx| {
            runs += 1;
            c.log.push(format!("run{runs}"));
            if runs == 3 {
                TaskControl::Cancel
            } else {
                TaskControl::Continue
            }
        });

        for _ in 0..10 {
            sched.tick(&mut ctx);
        }
        // Runs at ticks 1, 3, 5
        assert_eq!(ctx.log, vec!["run1", "run2", "run3"]);
        assert!(sched.is_empty());
    }

    #[test]
    fn test_gate_drops_tasks() {
        let mut sched = Scheduler::new();
        let mut ctx = Ctx::default();
        sched.schedule_repeating("rep", 0, 1, |c: &mut Ctx| {
            c.log.push("ran".into());
            TaskControl::Continue
        });
        sched.schedule_once("later", 5, |c: &mut Ctx| {
            c.log.push("later".into());
            TaskControl::Continue
        });

        sched.tick(&mut ctx);
        assert!(ctx.log.is_empty());
        // The not-yet-due task survives until it comes due
        assert_eq!(sched.len(), 1);
        for _ in 0..5 {
            sched.tick(&mut ctx);
        }
        assert!(sched.is_empty());
    }

    #[test]
    fn test_cancel_by_handle() {
        let mut sched = Scheduler::new();
        let mut ctx = live();
        let handle = sched.schedule_repeating("rep", 0, 1, |c: &mut Ctx| {
            c.log.push("ran".into());
            TaskControl::Continue
        });
        sched.tick(&mut ctx);
        assert!(sched.cancel(handle));
        assert!(!sched.cancel(handle));
        sched.tick(&mut ctx);
        assert_eq!(ctx.log.len(), 1);
    }

    struct Recorder;

    impl CountdownListener<Ctx> for Recorder {
        fn on_tick(&mut self, ctx: &mut Ctx, remaining: u32) {
            ctx.log.push(remaining.to_string());
        }

        fn on_finish(&mut self, ctx: &mut Ctx) {
            ctx.log.push("go".into());
        }
    }

    #[test]
    fn test_countdown_sequence() {
        let mut sched = Scheduler::new();
        let mut ctx = live();
        sched.schedule_repeating("countdown", 0, 20, Countdown::new(3, Recorder));

        for _ in 0..100 {
            sched.tick(&mut ctx);
        }
        assert_eq!(ctx.log, vec!["3", "2", "1", "go"]);
        assert!(!sched.has_task("countdown"));
    }

    #[test]
    fn test_countdown_from_zero_finishes_immediately() {
        let mut sched = Scheduler::new();
        let mut ctx = live();
        sched.schedule_repeating("countdown", 0, 20, Countdown::new(0, Recorder));
        sched.tick(&mut ctx);
        assert_eq!(ctx.log, vec!["go"]);
    }
}
