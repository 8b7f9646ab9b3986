//! # Synchronization Primitives
//!
//! Interrupt masking for the single-core Cortex-M target. The task
//! table and the scheduler scalars are shared between the foreground
//! (registration, cooperative dispatch, reset) and the tick interrupt;
//! any sequence that could leave the table half-shifted must run with
//! the tick excluded.
//!
//! On hosted targets (unit tests) there is no interrupt controller, so
//! both helpers degrade to plain calls. Tests model a tick arriving
//! mid-callback by re-entering the tick handler directly.

/// Execute a closure with interrupts disabled.
///
/// Keep critical sections short — the whole insertion path of
/// `schedule` runs under one, which is the longest the scheduler ever
/// masks the tick.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    cortex_m::interrupt::free(|_| f())
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

/// Execute a closure with interrupts re-enabled, restoring the
/// previous mask state afterwards.
///
/// Used around task callback invocations so the tick keeps advancing
/// other tasks' countdowns while a callback runs. Inside the tick
/// handler this is what allows a higher-priority deadline to nest into
/// a running callback.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[inline]
pub fn with_ticks_enabled<F: FnOnce()>(f: F) {
    let primask = cortex_m::register::primask::read();

    // Safety: single-core target; the scheduler re-checks priority on
    // every nested tick entry, so re-entrancy here is by contract.
    unsafe { cortex_m::interrupt::enable() };
    f();
    if primask.is_active() {
        cortex_m::interrupt::disable();
    }
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
#[inline]
pub fn with_ticks_enabled<F: FnOnce()>(f: F) {
    f()
}
