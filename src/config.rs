//! # Sked Configuration
//!
//! Compile-time constants governing the scheduler.
//! All limits are fixed at compile time — no dynamic allocation.

/// Maximum number of tasks the scheduler can hold. This bounds the
/// static task table; neither the tick handler nor the dispatcher
/// ever indexes past `task_count`, which is capped here.
pub const MAX_TASKS: usize = 16;

/// Tick resolution of the supported clock source, in microseconds.
/// All task periods and offsets must be multiples of this value
/// (remainders are truncated by the µs→tick conversion).
pub const TICK_PERIOD_US: u32 = 100;

/// Maximum per-task countdown value. Period, offset and countdown are
/// 16-bit tick counts, so the longest representable period is
/// `TICK_PERIOD_US * MAX_PERIOD_TICKS` = 6_553_500 µs.
pub const MAX_PERIOD_TICKS: u32 = u16::MAX as u32;

/// Reserved lowest priority. The scheduler uses this value to mean
/// "no task is currently running"; it may never be assigned to a task.
pub const MIN_PRIORITY: i8 = -127;

/// Saturation limit for the per-task miss counter.
pub const MISSES_MAX: u8 = 255;

/// Saturation limit for the per-task overrun counter.
pub const OVERRUNS_MAX: u8 = 255;

/// System clock frequency in Hz (default for STM32F4 at 16 MHz HSI).
/// Used to compute the SysTick reload value for one tick.
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;
