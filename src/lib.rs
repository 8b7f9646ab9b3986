//! # Sked — Fixed-Capacity Task Scheduler
//!
//! A small, interrupt-driven task scheduler for resource-constrained
//! single-core Cortex-M microcontrollers. Applications register short
//! callback routines, each with a period, a phase offset and a
//! priority, and Sked runs them at their configured cadence — either
//! preemptively from the tick interrupt itself, or cooperatively from
//! the application's main loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                  Application Callbacks                  │
//! ├────────────────────────────────────────────────────────┤
//! │              Scheduler Core (scheduler.rs)              │
//! │   init() · schedule() · tick() · dispatch() · start()   │
//! │   reset() · task_info() — priority-sorted task table    │
//! ├───────────────────────┬────────────────────────────────┤
//! │  Task Model (task.rs) │  Sync Primitives (sync.rs)     │
//! │  countdown · state    │  critical_section              │
//! │  misses · overruns    │  with_ticks_enabled            │
//! ├───────────────────────┴────────────────────────────────┤
//! │             Clock Source Port (arch/systick.rs)         │
//! │     100 µs periodic SysTick · start/stop · SysTick()    │
//! ├────────────────────────────────────────────────────────┤
//! │                  Cortex-M Hardware                      │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling Model
//!
//! - **Single stack.** There are no per-task stacks and no context
//!   switches. Preemption is nested interrupt entry: a tick arriving
//!   during a callback re-enters the tick handler on the same stack,
//!   and a strictly higher-priority ready task runs right there. The
//!   stack simply gets deeper while tasks preempt one another, so
//!   callbacks are expected to be short.
//! - **Priority-sorted table.** The task table (capacity 16, no heap)
//!   is kept sorted at registration: priority descending, then period
//!   ascending among equals. Both dispatch paths are a plain walk of
//!   the table, so priority order costs nothing at run time.
//! - **Two modes.** In preemptive mode the tick handler dispatches
//!   ready work itself. In non-preemptive mode it only advances
//!   countdowns, and the application drains ready tasks by calling
//!   `dispatch()` from its control loop.
//! - **Diagnostics, not failures.** A deadline elapsing while a task
//!   is still waiting (a miss) or still executing (an overrun) bumps a
//!   saturating per-task counter; the scheduler keeps running.
//!
//! ## Time Accounting
//!
//! The only unit of internal time is the tick: 100 µs of SysTick.
//! Periods and offsets are registered in microseconds and divided down
//! to 16-bit tick counts, which bounds a period at 6.5535 s.
//!
//! ## Memory Model
//!
//! - **No heap**: all state lives in the `Sked` value, typically a
//!   `static`
//! - **No `alloc`**: pure `core` only
//! - **Fixed-size task table**: `[Task; MAX_TASKS]`
//! - **Critical sections**: tick interrupt excluded around any table
//!   mutation that could leave it half-shifted
//!
//! ## Usage
//!
//! ```ignore
//! static mut SKED: Sked = Sked::new();
//!
//! let sked = unsafe { &mut *core::ptr::addr_of_mut!(SKED) };
//! sked.init(Mode::Preemptive, ClockSource::SysTick)?;
//! sked.schedule(10_000, 0, 5, sample_sensor)?;   // 10 ms
//! sked.schedule(1_000_000, 0, 0, heartbeat)?;    // 1 s
//! sked.start()?;
//! loop {
//!     cortex_m::asm::wfi();
//! }
//! ```

#![no_std]

pub mod arch;
pub mod config;
pub mod debug;
pub mod scheduler;
pub mod sync;
pub mod task;

pub use scheduler::{ClockSource, Error, Mode, Sked, State};
pub use task::{Task, TaskFn, TaskState};
