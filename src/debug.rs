//! # Diagnostic State Dump
//!
//! Renders scheduler and per-task state to any [`core::fmt::Write`]
//! sink (a UART writer on hardware, a byte buffer in tests). Consumes
//! only the scheduler's introspection accessors; reads are not
//! synchronized against the tick handler, so a dump taken while ticks
//! are live may show a torn snapshot — it is diagnostic, not
//! load-bearing.

use core::fmt::{self, Write};

use crate::config::TICK_PERIOD_US;
use crate::scheduler::{ClockSource, Mode, Sked, State};
use crate::task::TaskState;

/// Write a human-readable dump of the scheduler to `w`.
pub fn print_state<W: Write>(sked: &Sked, w: &mut W) -> fmt::Result {
    if sked.state() == State::Uninitialized {
        return writeln!(w, "### Sked is UNINITIALIZED.");
    }

    writeln!(w, "### Sked is INITIALIZED.")?;
    writeln!(
        w,
        "### Mode:            {}",
        match sked.mode() {
            Mode::Preemptive => "PREEMPTIVE",
            Mode::NonPreemptive => "NON-PREEMPTIVE",
        }
    )?;
    writeln!(
        w,
        "### Clock Source:    {}",
        match sked.clock_source() {
            ClockSource::SysTick => "SYSTICK",
            ClockSource::Tim2 => "TIM2",
        }
    )?;
    writeln!(w, "### Tick Period (us): {}", TICK_PERIOD_US)?;
    writeln!(w, "### Min Period (us):  {}", sked.min_period_us())?;
    writeln!(w, "### Max Period (us):  {}", sked.max_period_us())?;

    writeln!(w, "### Tasks: {}", sked.task_count())?;
    for i in 0..sked.task_count() {
        // task_count bounds the index, so the lookup cannot miss; the
        // dump should not die on a torn read regardless.
        let Some(task) = sked.task_info(i) else {
            break;
        };

        writeln!(
            w,
            "###   Task[{}]: ({}, {}, {}, {})",
            i,
            task.priority(),
            task.period(),
            task.offset(),
            task.countdown()
        )?;
        writeln!(
            w,
            "###     State: {}",
            match task.state() {
                TaskState::Idle => "IDLE",
                TaskState::Ready => "READY",
                TaskState::Running => "RUNNING",
            }
        )?;
        writeln!(w, "###     Misses: {}", task.misses())?;
        writeln!(w, "###     Overruns: {}", task.overruns())?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
