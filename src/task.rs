//! # Task Model
//!
//! One `Task` record per registered unit of periodic work. A task is a
//! callback plus its cadence (period, first-activation offset), its
//! dispatch priority, and the bookkeeping the tick handler mutates:
//! the countdown to the next deadline, the state machine, and the
//! saturating miss/overrun counters.
//!
//! ## State machine
//!
//! ```text
//!   ┌────────┐  deadline   ┌────────┐  dispatch   ┌─────────┐
//!   │  Idle  │ ──────────► │ Ready  │ ──────────► │ Running │
//!   └────────┘             └────────┘             └─────────┘
//!        ▲                      │ deadline             │ deadline
//!        │                      ▼                      ▼
//!        │                  misses += 1           overruns += 1
//!        └───────────── callback returns ──────────────┘
//! ```
//!
//! A deadline arriving while the task is still `Ready` means a whole
//! period went by without it ever being dispatched (a miss). A deadline
//! arriving while it is `Running` means the previous invocation has not
//! finished yet (an overrun). Both counters saturate at 255 and are
//! diagnostic only — the scheduler keeps going regardless.

use crate::config::{MISSES_MAX, OVERRUNS_MAX};

/// Execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for its next deadline.
    Idle,
    /// Deadline reached; waiting to be dispatched.
    Ready,
    /// Callback currently executing.
    Running,
}

/// Task callback: a plain function, invoked synchronously by the
/// scheduler. The type makes the "never null" invariant structural —
/// there is no empty value to check for at registration time.
pub type TaskFn = fn();

/// One slot of the scheduler's task table.
///
/// `period`, `offset` and `count` are tick counts (one tick =
/// `config::TICK_PERIOD_US`). `count` is the only field the tick
/// handler mutates every tick; everything else is either immutable
/// after registration or changed only at deadline/dispatch boundaries.
#[derive(Clone, Copy)]
pub struct Task {
    pub(crate) fcn: TaskFn,
    pub(crate) count: u16,
    pub(crate) period: u16,
    pub(crate) offset: u16,
    pub(crate) misses: u8,
    pub(crate) overruns: u8,
    pub(crate) priority: i8,
    pub(crate) state: TaskState,
}

fn unscheduled() {}

impl Task {
    /// An unregistered slot. Slots past `task_count` are never read,
    /// so the placeholder values (including the stub callback) are
    /// only there to keep the table array fully initialized.
    pub(crate) const EMPTY: Task = Task {
        fcn: unscheduled,
        count: 0,
        period: 0,
        offset: 0,
        misses: 0,
        overruns: 0,
        priority: 0,
        state: TaskState::Idle,
    };

    /// Advance this task by one tick and drive the state machine when
    /// its deadline is reached.
    ///
    /// The countdown starts at `offset` on registration, so the first
    /// deadline honors the phase offset; every reload afterwards uses
    /// `period`, which keeps the phase baked in without reapplying it.
    pub(crate) fn advance(&mut self) {
        if self.count != 0 {
            self.count -= 1;
        }

        if self.count == 0 {
            match self.state {
                // Deadline reached while idle: ready to run.
                TaskState::Idle => self.state = TaskState::Ready,
                // Previous invocation still in progress.
                TaskState::Running => self.record_overrun(),
                // Never dispatched since the last deadline.
                TaskState::Ready => self.record_miss(),
            }

            self.count = self.period;
        }
    }

    fn record_miss(&mut self) {
        if self.misses < MISSES_MAX {
            self.misses += 1;
        }
    }

    fn record_overrun(&mut self) {
        if self.overruns < OVERRUNS_MAX {
            self.overruns += 1;
        }
    }

    /// Period in ticks.
    #[inline]
    pub fn period(&self) -> u16 {
        self.period
    }

    /// First-activation offset in ticks, as registered.
    #[inline]
    pub fn offset(&self) -> u16 {
        self.offset
    }

    /// Ticks remaining until the next deadline.
    #[inline]
    pub fn countdown(&self) -> u16 {
        self.count
    }

    /// Dispatch priority (higher runs first).
    #[inline]
    pub fn priority(&self) -> i8 {
        self.priority
    }

    /// Current execution state.
    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Deadlines that elapsed while this task was ready but not yet
    /// dispatched. Saturates at 255.
    #[inline]
    pub fn misses(&self) -> u8 {
        self.misses
    }

    /// Deadlines that elapsed while a previous invocation was still
    /// running. Saturates at 255.
    #[inline]
    pub fn overruns(&self) -> u8 {
        self.overruns
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
