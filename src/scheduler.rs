//! # Scheduler Core
//!
//! Fixed-capacity, tick-driven task scheduler. An application registers
//! callbacks with a period, a phase offset and a priority before
//! starting the tick source; after that the tick handler advances every
//! task's countdown once per tick and, in preemptive mode, dispatches
//! ready work directly from interrupt context.
//!
//! ## Dispatch model
//!
//! The task table is kept sorted at insertion time — priority
//! descending, then period ascending among equal priorities — so both
//! dispatch paths are a plain front-to-back walk. This trades a little
//! registration-time work for a dispatch path that never searches,
//! which is the right trade for code that runs inside an interrupt
//! handler.
//!
//! - **Preemptive**: the tick handler itself invokes ready callbacks,
//!   with the tick interrupt re-enabled for their duration. A deadline
//!   of a strictly higher-priority task arriving mid-callback re-enters
//!   the handler on the same stack and runs nested — that re-entry *is*
//!   the preemption mechanism. The comparison is strict (`>`), so
//!   equal-priority tasks never interrupt each other.
//! - **Cooperative**: the tick handler only does countdown bookkeeping;
//!   the application drains ready tasks by calling [`Sked::dispatch`]
//!   from its main loop.
//!
//! There is one call stack. Preemption depth is bounded by the number
//! of distinct priority levels that can be simultaneously ready, so
//! callbacks are expected to be short.

use crate::arch::systick;
use crate::config::{MAX_PERIOD_TICKS, MAX_TASKS, MIN_PRIORITY, TICK_PERIOD_US};
use crate::sync;
use crate::task::{Task, TaskFn, TaskState};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Dispatch mode, fixed at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The tick handler dispatches ready tasks itself; higher-priority
    /// deadlines nest into running callbacks.
    Preemptive,
    /// The tick handler only advances countdowns; the application
    /// drives dispatch via [`Sked::dispatch`].
    NonPreemptive,
}

/// Hardware tick source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSource {
    /// Cortex-M SysTick, 100 µs resolution. The only supported source.
    SysTick,
    /// Placeholder for a general-purpose timer port; registering it
    /// fails with [`Error::NotImplemented`] until a port exists.
    Tim2,
}

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Initialized,
}

/// Errors returned by the scheduler's public operations.
///
/// None of these are retried internally: sequencing errors mean the
/// caller must reorder calls, validation errors leave the task table
/// untouched. Runtime anomalies (misses, overruns) are *not* errors —
/// they are saturating counters on each [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Operation requires a prior successful `init`.
    NotInitialized,
    /// The task table is at capacity.
    TooManyTasks,
    /// Period is zero, below the tick resolution, or above the maximum
    /// the countdown counter can represent.
    InvalidPeriod,
    /// Kept for the stable error-code table; a callback slot cannot be
    /// empty in this API, so this is never produced.
    InvalidFunction,
    /// Offset is above the maximum period, or nonzero but below the
    /// tick resolution.
    InvalidOffset,
    /// Priority equals the reserved lowest-priority sentinel.
    InvalidPriority,
    /// Operation is not valid in the current state.
    InvalidOperation,
    /// Operation belongs to the other dispatch mode.
    WrongMode,
    /// The requested clock source has no port yet.
    NotImplemented,
}

impl Error {
    /// Stable signed error code (zero is success, never constructed
    /// here). Matches the on-wire table used by diagnostics consumers.
    pub const fn code(self) -> i8 {
        match self {
            Error::NotInitialized => -1,
            Error::TooManyTasks => -2,
            Error::InvalidPeriod => -3,
            Error::InvalidFunction => -4,
            Error::InvalidOffset => -5,
            Error::InvalidPriority => -6,
            Error::InvalidOperation => -7,
            Error::WrongMode => -8,
            Error::NotImplemented => -99,
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// The scheduler: owner of the task table and the tick bookkeeping.
///
/// Constructed once per tick source, typically in a `static` so the
/// tick exception can reach it:
///
/// ```ignore
/// static mut SKED: Sked = Sked::new();
/// ```
///
/// `init` binds the instance to the tick source; `schedule` fills the
/// table; `start` arms the tick. In cooperative mode the main loop
/// calls `dispatch` forever; in preemptive mode it has nothing left to
/// do.
pub struct Sked {
    state: State,
    mode: Mode,
    clk_src: ClockSource,
    min_period_us: u32,
    max_period_us: u32,
    tasks: [Task; MAX_TASKS],
    task_count: usize,
    /// Priority of the task currently executing, in the nesting sense:
    /// a nested tick may only dispatch strictly above this. Sentinel
    /// `MIN_PRIORITY` when nothing is running.
    current_priority: i8,
}

impl Sked {
    /// A fresh, uninitialized scheduler with an empty table.
    pub const fn new() -> Self {
        Self {
            state: State::Uninitialized,
            mode: Mode::Preemptive,
            clk_src: ClockSource::SysTick,
            min_period_us: 0,
            max_period_us: 0,
            tasks: [Task::EMPTY; MAX_TASKS],
            task_count: 0,
            current_priority: MIN_PRIORITY,
        }
    }

    /// Initialize the scheduler against a tick source.
    ///
    /// Derives the period bounds from the source's resolution and
    /// counter width, programs the timer into a stopped periodic
    /// configuration, and binds this instance as the tick handler's
    /// target. Ticks do not start until [`Sked::start`].
    ///
    /// Re-initializing is allowed and rebinds mode and source.
    pub fn init(&mut self, mode: Mode, clk_src: ClockSource) -> Result<(), Error> {
        self.mode = mode;
        self.clk_src = clk_src;

        let this: *mut Sked = self;
        sync::critical_section(|| match clk_src {
            ClockSource::SysTick => {
                self.max_period_us = TICK_PERIOD_US * MAX_PERIOD_TICKS;
                self.min_period_us = TICK_PERIOD_US;

                systick::configure();
                systick::bind(this);

                self.state = State::Initialized;
                Ok(())
            }
            ClockSource::Tim2 => Err(Error::NotImplemented),
        })
    }

    /// Register a periodic task.
    ///
    /// `period_us` and `offset_us` are in microseconds and are
    /// converted to ticks by integer division against the tick
    /// resolution; callers supply multiples of the resolution or accept
    /// truncation. The offset delays only the first activation.
    ///
    /// The insertion keeps the table sorted (priority descending,
    /// period ascending within equal priority) and runs with the tick
    /// interrupt excluded — the tick handler walks this table by index
    /// and must never observe a half-shifted array.
    pub fn schedule(
        &mut self,
        period_us: u32,
        offset_us: u32,
        priority: i8,
        fcn: TaskFn,
    ) -> Result<(), Error> {
        // Bounds only exist after init.
        if self.state == State::Uninitialized {
            return Err(Error::NotInitialized);
        }

        if self.task_count >= MAX_TASKS {
            return Err(Error::TooManyTasks);
        }

        if period_us > self.max_period_us || period_us < self.min_period_us {
            return Err(Error::InvalidPeriod);
        }

        // A zero offset means "no phase delay"; anything else must be
        // at least one tick and fit the countdown counter.
        if offset_us > self.max_period_us || (offset_us > 0 && offset_us < self.min_period_us) {
            return Err(Error::InvalidOffset);
        }

        if priority <= MIN_PRIORITY {
            return Err(Error::InvalidPriority);
        }

        let period = (period_us / TICK_PERIOD_US) as u16;
        let offset = (offset_us / TICK_PERIOD_US) as u16;

        sync::critical_section(|| {
            // Insertion sort: find the first slot this task goes in
            // front of. Among equal priorities the shorter period sorts
            // first, so fast tasks pay the least scan latency per tick.
            let mut index = self.task_count;
            for i in 0..self.task_count {
                let t = &self.tasks[i];
                if t.priority < priority || (t.priority == priority && period < t.period) {
                    index = i;
                    break;
                }
            }

            // Shift the tail down one slot to make room.
            for i in (index..self.task_count).rev() {
                self.tasks[i + 1] = self.tasks[i];
            }

            // The countdown starts at the offset: an offset task does
            // not become ready on the first deadline sweep, and the
            // phase stays baked into every later period reload.
            self.tasks[index] = Task {
                fcn,
                count: offset,
                period,
                offset,
                misses: 0,
                overruns: 0,
                priority,
                state: TaskState::Idle,
            };

            self.task_count += 1;
        });

        Ok(())
    }

    /// Advance the scheduler by one tick.
    ///
    /// Invoked from the tick interrupt once per elapsed tick period
    /// (tests call it directly). First pass: every live task's
    /// countdown and state machine. Second pass, preemptive mode only:
    /// dispatch ready tasks; because the table is priority-sorted the
    /// walk runs strictly-higher-priority work first, and nested tick
    /// entries during a callback preempt it with anything higher still.
    pub fn tick(&mut self) {
        for i in 0..self.task_count {
            self.tasks[i].advance();
        }

        if self.mode == Mode::NonPreemptive {
            return;
        }

        for i in 0..self.task_count {
            // Strict comparison: equal-priority work waits for the
            // running callback to finish, which is what prevents
            // priority-tie livelock.
            if self.tasks[i].state == TaskState::Ready
                && self.tasks[i].priority > self.current_priority
            {
                self.tasks[i].state = TaskState::Running;
                self.current_priority = self.tasks[i].priority;

                let fcn = self.tasks[i].fcn;
                sync::with_ticks_enabled(fcn);

                // Back to the sentinel, or lower-priority tasks would
                // never run again.
                self.current_priority = MIN_PRIORITY;
                self.tasks[i].state = TaskState::Idle;
            }
        }
    }

    /// Run one cooperative dispatch pass.
    ///
    /// Non-preemptive mode only: walks the table once and executes
    /// every ready task, with the tick interrupt live during callbacks
    /// so other countdowns keep advancing. Returns after the pass; it
    /// never blocks waiting for work. Priority order is implicit in the
    /// table order, and nothing here preempts a running callback.
    pub fn dispatch(&mut self) -> Result<(), Error> {
        if self.state == State::Uninitialized {
            return Err(Error::NotInitialized);
        }

        if self.mode == Mode::Preemptive {
            // Dispatch is owned by the tick handler in that mode.
            return Err(Error::WrongMode);
        }

        for i in 0..self.task_count {
            let ready = sync::critical_section(|| {
                if self.tasks[i].state == TaskState::Ready {
                    self.tasks[i].state = TaskState::Running;
                    true
                } else {
                    false
                }
            });

            if ready {
                let fcn = self.tasks[i].fcn;
                fcn();
                sync::critical_section(|| {
                    self.tasks[i].state = TaskState::Idle;
                });
            }
        }

        Ok(())
    }

    /// Start delivering ticks: clear any pending tick interrupt, zero
    /// the counter and enable. Idempotent.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.state == State::Uninitialized {
            return Err(Error::NotInitialized);
        }

        systick::start_ticking();
        Ok(())
    }

    /// Tear the scheduler back down to the uninitialized state.
    ///
    /// Stops the tick source, invalidates every task (by zeroing the
    /// count — slots are never scrubbed, `task_count` defines
    /// validity), clears the period bounds and restores the defaults.
    /// Runs atomically with respect to the tick handler. Idempotent.
    pub fn reset(&mut self) {
        sync::critical_section(|| {
            systick::stop_ticking();

            self.task_count = 0;
            self.min_period_us = 0;
            self.max_period_us = 0;
            self.state = State::Uninitialized;
            self.current_priority = MIN_PRIORITY;
            self.mode = Mode::Preemptive;
        });
    }

    // -----------------------------------------------------------------------
    // Introspection
    //
    // Reads are not synchronized against the tick handler; a torn
    // snapshot is acceptable for diagnostics.
    // -----------------------------------------------------------------------

    /// Number of live tasks.
    #[inline]
    pub fn task_count(&self) -> usize {
        self.task_count
    }

    /// Read-only view of a task by table index. Index 0 is always the
    /// highest-priority live task; out-of-range returns `None`.
    pub fn task_info(&self, i: usize) -> Option<&Task> {
        if i < self.task_count {
            Some(&self.tasks[i])
        } else {
            None
        }
    }

    /// Lifecycle state.
    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Dispatch mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The bound tick source.
    #[inline]
    pub fn clock_source(&self) -> ClockSource {
        self.clk_src
    }

    /// Shortest registrable period in µs (one tick). Zero before init.
    #[inline]
    pub fn min_period_us(&self) -> u32 {
        self.min_period_us
    }

    /// Longest registrable period in µs (tick resolution times the
    /// maximum countdown value). Zero before init.
    #[inline]
    pub fn max_period_us(&self) -> u32 {
        self.max_period_us
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    fn stub() {}

    fn init_preemptive() -> Sked {
        let mut sked = Sked::new();
        sked.init(Mode::Preemptive, ClockSource::SysTick).unwrap();
        sked
    }

    // -- lifecycle ----------------------------------------------------------

    #[test]
    fn start_and_schedule_require_init() {
        let mut sked = Sked::new();
        assert_eq!(sked.start(), Err(Error::NotInitialized));
        assert_eq!(sked.schedule(1000, 0, 0, stub), Err(Error::NotInitialized));
        assert_eq!(sked.dispatch(), Err(Error::NotInitialized));
    }

    #[test]
    fn init_rejects_unported_clock_source() {
        let mut sked = Sked::new();
        assert_eq!(
            sked.init(Mode::Preemptive, ClockSource::Tim2),
            Err(Error::NotImplemented)
        );
        assert_eq!(sked.state(), State::Uninitialized);
    }

    #[test]
    fn init_derives_period_bounds() {
        let mut sked = Sked::new();
        assert_eq!(sked.init(Mode::Preemptive, ClockSource::SysTick), Ok(()));
        assert_eq!(sked.state(), State::Initialized);
        assert_eq!(sked.min_period_us(), 100);
        // 100 µs resolution on a 16-bit countdown.
        assert_eq!(sked.max_period_us(), 6_553_500);
        assert_eq!(sked.task_count(), 0);

        // Re-init is allowed and switches mode.
        assert_eq!(
            sked.init(Mode::NonPreemptive, ClockSource::SysTick),
            Ok(())
        );
        assert_eq!(sked.mode(), Mode::NonPreemptive);

        assert_eq!(sked.start(), Ok(()));
    }

    #[test]
    fn start_is_idempotent() {
        let mut sked = init_preemptive();
        assert_eq!(sked.start(), Ok(()));
        assert_eq!(sked.start(), Ok(()));
        assert_eq!(sked.state(), State::Initialized);
    }

    #[test]
    fn reset_clears_everything_and_is_idempotent() {
        let mut sked = init_preemptive();
        sked.schedule(1000, 0, 0, stub).unwrap();
        sked.schedule(2000, 0, 5, stub).unwrap();

        sked.reset();
        assert_eq!(sked.task_count(), 0);
        assert_eq!(sked.state(), State::Uninitialized);
        assert_eq!(sked.max_period_us(), 0);
        assert_eq!(sked.min_period_us(), 0);
        assert_eq!(sked.mode(), Mode::Preemptive);
        assert!(sked.task_info(0).is_none());

        // A second reset observes the same state.
        sked.reset();
        assert_eq!(sked.task_count(), 0);
        assert_eq!(sked.state(), State::Uninitialized);

        assert_eq!(sked.schedule(1000, 0, 0, stub), Err(Error::NotInitialized));
    }

    // -- registration validation --------------------------------------------

    #[test]
    fn schedule_rejects_bad_periods() {
        let mut sked = init_preemptive();

        assert_eq!(sked.schedule(0, 0, 0, stub), Err(Error::InvalidPeriod));
        assert_eq!(sked.schedule(99, 0, 0, stub), Err(Error::InvalidPeriod));
        assert_eq!(
            sked.schedule(6_553_500 + 1, 0, 0, stub),
            Err(Error::InvalidPeriod)
        );
        assert_eq!(sked.task_count(), 0);

        // Exactly the bounds are fine.
        assert_eq!(sked.schedule(100, 0, 0, stub), Ok(()));
        assert_eq!(sked.schedule(6_553_500, 0, 0, stub), Ok(()));
        assert_eq!(sked.task_count(), 2);
    }

    #[test]
    fn schedule_rejects_bad_offsets() {
        let mut sked = init_preemptive();

        // Nonzero but below one tick.
        assert_eq!(sked.schedule(100, 99, 0, stub), Err(Error::InvalidOffset));
        assert_eq!(
            sked.schedule(100, 6_553_500 + 1, 0, stub),
            Err(Error::InvalidOffset)
        );
        assert_eq!(sked.task_count(), 0);

        assert_eq!(sked.schedule(100, 0, 0, stub), Ok(()));
        assert_eq!(sked.schedule(100, 100, 0, stub), Ok(()));
        assert_eq!(sked.task_count(), 2);
    }

    #[test]
    fn schedule_rejects_the_priority_sentinel() {
        let mut sked = init_preemptive();

        assert_eq!(
            sked.schedule(100, 0, MIN_PRIORITY, stub),
            Err(Error::InvalidPriority)
        );
        assert_eq!(
            sked.schedule(100, 0, i8::MIN, stub),
            Err(Error::InvalidPriority)
        );
        assert_eq!(sked.task_count(), 0);

        assert_eq!(sked.schedule(100, 0, MIN_PRIORITY + 1, stub), Ok(()));
        assert_eq!(sked.task_count(), 1);
    }

    #[test]
    fn schedule_fills_to_capacity_then_rejects() {
        let mut sked = init_preemptive();

        for i in 0..MAX_TASKS {
            assert_eq!(sked.schedule(100, 0, 0, stub), Ok(()));
            assert_eq!(sked.task_count(), i + 1);
        }
        assert_eq!(sked.schedule(100, 0, 0, stub), Err(Error::TooManyTasks));
        assert_eq!(sked.task_count(), MAX_TASKS);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(Error::NotInitialized.code(), -1);
        assert_eq!(Error::TooManyTasks.code(), -2);
        assert_eq!(Error::InvalidPeriod.code(), -3);
        assert_eq!(Error::InvalidFunction.code(), -4);
        assert_eq!(Error::InvalidOffset.code(), -5);
        assert_eq!(Error::InvalidPriority.code(), -6);
        assert_eq!(Error::InvalidOperation.code(), -7);
        assert_eq!(Error::WrongMode.code(), -8);
        assert_eq!(Error::NotImplemented.code(), -99);
    }

    // -- table ordering -----------------------------------------------------

    #[test]
    fn equal_priority_sorts_by_shortest_period_first() {
        let mut sked = init_preemptive();

        // 1 s task at priority 0.
        sked.schedule(1_000_000, 0, 0, stub).unwrap();
        assert_eq!(sked.task_info(0).unwrap().period(), 10_000);

        // 1 ms task at the same priority lands in front of it.
        sked.schedule(1_000, 0, 0, stub).unwrap();
        assert_eq!(sked.task_info(0).unwrap().period(), 10);
        assert_eq!(sked.task_info(1).unwrap().period(), 10_000);
    }

    #[test]
    fn lower_priority_task_lands_at_the_end() {
        let mut sked = init_preemptive();
        sked.schedule(1_000_000, 0, 0, stub).unwrap();
        sked.schedule(1_000, 0, 0, stub).unwrap();

        sked.schedule(100_000, 0, -1, stub).unwrap();
        assert_eq!(sked.task_count(), 3);
        assert_eq!(sked.task_info(2).unwrap().period(), 1_000);
        assert_eq!(sked.task_info(2).unwrap().priority(), -1);
    }

    #[test]
    fn higher_priority_task_shifts_the_table_down() {
        let mut sked = init_preemptive();
        sked.schedule(1_000_000, 0, 0, stub).unwrap();
        sked.schedule(1_000, 0, 0, stub).unwrap();
        sked.schedule(100_000, 0, -1, stub).unwrap();

        sked.schedule(200_000, 0, 127, stub).unwrap();
        assert_eq!(sked.task_count(), 4);
        assert_eq!(sked.task_info(0).unwrap().priority(), 127);
        assert_eq!(sked.task_info(0).unwrap().period(), 2_000);
        assert_eq!(sked.task_info(1).unwrap().period(), 10);
        assert_eq!(sked.task_info(2).unwrap().period(), 10_000);
        assert_eq!(sked.task_info(3).unwrap().priority(), -1);
    }

    #[test]
    fn equal_priority_largest_period_goes_last() {
        let mut sked = init_preemptive();
        sked.schedule(10_000, 0, 0, stub).unwrap();
        sked.schedule(1_000_000, 0, 0, stub).unwrap();
        sked.schedule(100_000, 0, 0, stub).unwrap();

        assert_eq!(sked.task_info(0).unwrap().period(), 100);
        assert_eq!(sked.task_info(1).unwrap().period(), 1_000);
        assert_eq!(sked.task_info(2).unwrap().period(), 10_000);
    }

    // -- cooperative mode ---------------------------------------------------

    #[test]
    fn nonpreemptive_tick_only_does_bookkeeping() {
        static HITS: AtomicU32 = AtomicU32::new(0);
        fn cb() {
            HITS.fetch_add(1, Ordering::Relaxed);
        }

        let mut sked = Sked::new();
        sked.init(Mode::NonPreemptive, ClockSource::SysTick).unwrap();
        sked.schedule(100, 0, 0, cb).unwrap();

        sked.tick();
        assert_eq!(HITS.load(Ordering::Relaxed), 0);
        assert_eq!(sked.task_info(0).unwrap().state(), TaskState::Ready);

        sked.dispatch().unwrap();
        assert_eq!(HITS.load(Ordering::Relaxed), 1);
        assert_eq!(sked.task_info(0).unwrap().state(), TaskState::Idle);

        // Nothing ready: the pass is a no-op.
        sked.dispatch().unwrap();
        assert_eq!(HITS.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn dispatch_runs_ready_tasks_in_priority_order() {
        static ORDER: [AtomicU32; 2] = [AtomicU32::new(0), AtomicU32::new(0)];
        static SEQ: AtomicU32 = AtomicU32::new(0);
        fn high() {
            ORDER[0].store(SEQ.fetch_add(1, Ordering::Relaxed) + 1, Ordering::Relaxed);
        }
        fn low() {
            ORDER[1].store(SEQ.fetch_add(1, Ordering::Relaxed) + 1, Ordering::Relaxed);
        }

        let mut sked = Sked::new();
        sked.init(Mode::NonPreemptive, ClockSource::SysTick).unwrap();
        // Registered low first; the table order still puts high first.
        sked.schedule(100, 0, 0, low).unwrap();
        sked.schedule(100, 0, 10, high).unwrap();

        sked.tick();
        sked.dispatch().unwrap();

        assert_eq!(ORDER[0].load(Ordering::Relaxed), 1);
        assert_eq!(ORDER[1].load(Ordering::Relaxed), 2);
    }

    #[test]
    fn dispatch_is_the_wrong_mode_when_preemptive() {
        let mut sked = init_preemptive();
        assert_eq!(sked.dispatch(), Err(Error::WrongMode));
    }

    // -- preemptive mode ----------------------------------------------------

    #[test]
    fn preemptive_tick_dispatches_on_the_deadline() {
        static HITS: AtomicU32 = AtomicU32::new(0);
        fn cb() {
            HITS.fetch_add(1, Ordering::Relaxed);
        }

        let mut sked = init_preemptive();
        // 500 µs period, no offset: ready on the very first tick.
        sked.schedule(500, 0, 0, cb).unwrap();

        sked.tick();
        assert_eq!(HITS.load(Ordering::Relaxed), 1);
        assert_eq!(sked.task_info(0).unwrap().state(), TaskState::Idle);

        // Next activation one full period later.
        for _ in 0..4 {
            sked.tick();
        }
        assert_eq!(HITS.load(Ordering::Relaxed), 1);
        sked.tick();
        assert_eq!(HITS.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn offset_delays_the_first_activation_only() {
        static HITS: AtomicU32 = AtomicU32::new(0);
        fn cb() {
            HITS.fetch_add(1, Ordering::Relaxed);
        }

        let mut sked = init_preemptive();
        // 300 µs period, 500 µs offset.
        sked.schedule(300, 500, 0, cb).unwrap();

        for _ in 0..4 {
            sked.tick();
        }
        assert_eq!(HITS.load(Ordering::Relaxed), 0);
        sked.tick();
        assert_eq!(HITS.load(Ordering::Relaxed), 1);

        // From here on the cadence is the period, not the offset.
        sked.tick();
        sked.tick();
        assert_eq!(HITS.load(Ordering::Relaxed), 1);
        sked.tick();
        assert_eq!(HITS.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn higher_priority_deadline_nests_into_a_running_callback() {
        // The slow task's callback pumps ticks through the scheduler
        // pointer, the way a live tick interrupt re-enters the handler
        // while a callback runs.
        static mut SKED: Sked = Sked::new();
        static SLOW_ACTIVE: AtomicU32 = AtomicU32::new(0);
        static FAST_SAW_SLOW_ACTIVE: AtomicU32 = AtomicU32::new(0);
        static FAST_HITS: AtomicU32 = AtomicU32::new(0);

        fn slow() {
            SLOW_ACTIVE.store(1, Ordering::Relaxed);
            for _ in 0..4 {
                unsafe { (*core::ptr::addr_of_mut!(SKED)).tick() };
            }
            SLOW_ACTIVE.store(0, Ordering::Relaxed);
        }
        fn fast() {
            FAST_HITS.fetch_add(1, Ordering::Relaxed);
            if SLOW_ACTIVE.load(Ordering::Relaxed) == 1 {
                FAST_SAW_SLOW_ACTIVE.fetch_add(1, Ordering::Relaxed);
            }
        }

        let sked = unsafe { &mut *core::ptr::addr_of_mut!(SKED) };
        sked.init(Mode::Preemptive, ClockSource::SysTick).unwrap();
        // Slow: low priority, long period, ready immediately.
        sked.schedule(10_000, 0, 0, slow).unwrap();
        // Fast: higher priority, first deadline two ticks in — lands
        // mid-slow-callback.
        sked.schedule(200, 200, 10, fast).unwrap();

        sked.tick();

        assert_eq!(FAST_SAW_SLOW_ACTIVE.load(Ordering::Relaxed), 2);
        assert_eq!(FAST_HITS.load(Ordering::Relaxed), 2);
        assert_eq!(sked.task_info(0).unwrap().state(), TaskState::Idle);
        assert_eq!(sked.task_info(1).unwrap().state(), TaskState::Idle);
        assert_eq!(sked.task_info(0).unwrap().misses(), 0);
    }

    #[test]
    fn equal_priority_never_nests() {
        static mut SKED: Sked = Sked::new();
        static X_HITS: AtomicU32 = AtomicU32::new(0);
        static Y_HITS: AtomicU32 = AtomicU32::new(0);

        // X pumps three nested ticks; Y shares its priority and has a
        // one-tick period, so its deadline fires during every nested
        // entry — and must wait regardless.
        fn x() {
            X_HITS.fetch_add(1, Ordering::Relaxed);
            for _ in 0..3 {
                unsafe { (*core::ptr::addr_of_mut!(SKED)).tick() };
            }
        }
        fn y() {
            Y_HITS.fetch_add(1, Ordering::Relaxed);
        }

        let sked = unsafe { &mut *core::ptr::addr_of_mut!(SKED) };
        sked.init(Mode::Preemptive, ClockSource::SysTick).unwrap();
        sked.schedule(100, 0, 5, y).unwrap(); // index 0: shorter period
        sked.schedule(1_000, 0, 5, x).unwrap(); // index 1

        sked.tick();

        // Y ran once at the top level (before X), never nested; its
        // deadlines during X's callback were recorded as misses.
        assert_eq!(Y_HITS.load(Ordering::Relaxed), 1);
        assert_eq!(X_HITS.load(Ordering::Relaxed), 1);
        assert_eq!(sked.task_info(0).unwrap().misses(), 2);
        assert_eq!(sked.task_info(0).unwrap().state(), TaskState::Ready);
    }

    #[test]
    fn low_priority_task_waits_out_a_long_high_priority_callback() {
        // Modeled on the long-runner scenario: a priority-127 task
        // whose callback spans 100 ms of ticks, next to a priority-0
        // 5 ms task. The fast task cannot preempt upward, so its
        // deadlines accumulate as misses until the long callback
        // returns; afterwards its activations settle to exactly one
        // period apart.
        static mut SKED: Sked = Sked::new();
        static NOW: AtomicU32 = AtomicU32::new(0);
        static SLOW_STAMP: AtomicU32 = AtomicU32::new(0);
        static SLOW_HITS: AtomicU32 = AtomicU32::new(0);
        static FAST_STAMPS: [AtomicU32; 8] = [
            AtomicU32::new(0),
            AtomicU32::new(0),
            AtomicU32::new(0),
            AtomicU32::new(0),
            AtomicU32::new(0),
            AtomicU32::new(0),
            AtomicU32::new(0),
            AtomicU32::new(0),
        ];
        static FAST_LEN: AtomicUsize = AtomicUsize::new(0);

        unsafe fn pump(n: u32) {
            for _ in 0..n {
                NOW.fetch_add(1, Ordering::Relaxed);
                (*core::ptr::addr_of_mut!(SKED)).tick();
            }
        }

        fn slow() {
            SLOW_HITS.fetch_add(1, Ordering::Relaxed);
            SLOW_STAMP.store(NOW.load(Ordering::Relaxed), Ordering::Relaxed);
            // Busy for 100 ms: 1000 ticks arrive mid-callback.
            unsafe { pump(1000) };
        }
        fn fast() {
            let i = FAST_LEN.fetch_add(1, Ordering::Relaxed);
            if i < FAST_STAMPS.len() {
                FAST_STAMPS[i].store(NOW.load(Ordering::Relaxed), Ordering::Relaxed);
            }
        }

        let sked = unsafe { &mut *core::ptr::addr_of_mut!(SKED) };
        sked.init(Mode::Preemptive, ClockSource::SysTick).unwrap();
        sked.schedule(1_000_000, 0, 127, slow).unwrap();
        sked.schedule(5_000, 0, 0, fast).unwrap();

        // First outer tick runs the whole long callback nested inside.
        unsafe { pump(1) };

        // The long task ran once, first.
        assert_eq!(SLOW_HITS.load(Ordering::Relaxed), 1);
        let slow_stamp = SLOW_STAMP.load(Ordering::Relaxed);
        let first_fast = FAST_STAMPS[0].load(Ordering::Relaxed);
        assert!(slow_stamp < first_fast);

        // The fast task was armed on the same first tick but sorted
        // after the long task, so all 20 deadlines that elapsed during
        // the busy-wait were misses.
        let fi = sked.task_info(1).unwrap();
        assert_eq!(fi.misses(), 20);
        assert_eq!(FAST_LEN.load(Ordering::Relaxed), 1);

        // Let a few more periods elapse at top level.
        unsafe { pump(200) };

        let n = FAST_LEN.load(Ordering::Relaxed);
        assert_eq!(n, 5);
        // Activations are spaced exactly one period (50 ticks) apart,
        // including the gap between the catch-up run at the end of the
        // long callback and the next on-deadline run.
        for i in 1..n {
            let a = FAST_STAMPS[i - 1].load(Ordering::Relaxed);
            let b = FAST_STAMPS[i].load(Ordering::Relaxed);
            assert_eq!(b - a, 50);
        }
        // And no further misses accumulate.
        assert_eq!(sked.task_info(1).unwrap().misses(), 20);
    }

    #[test]
    fn overruns_count_deadlines_spanned_by_one_invocation() {
        static mut SKED: Sked = Sked::new();
        static HITS: AtomicU32 = AtomicU32::new(0);

        // The callback outlives three of its own periods.
        fn cb() {
            if HITS.fetch_add(1, Ordering::Relaxed) == 0 {
                for _ in 0..3 {
                    unsafe { (*core::ptr::addr_of_mut!(SKED)).tick() };
                }
            }
        }

        let sked = unsafe { &mut *core::ptr::addr_of_mut!(SKED) };
        sked.init(Mode::Preemptive, ClockSource::SysTick).unwrap();
        sked.schedule(100, 0, 0, cb).unwrap();

        sked.tick();

        assert_eq!(HITS.load(Ordering::Relaxed), 1);
        assert_eq!(sked.task_info(0).unwrap().overruns(), 3);
        assert_eq!(sked.task_info(0).unwrap().state(), TaskState::Idle);
    }
}
