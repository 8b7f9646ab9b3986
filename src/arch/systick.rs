//! # SysTick Port
//!
//! Programs the Cortex-M SysTick timer as the scheduler's tick source:
//! periodic-compare mode at `TICK_PERIOD_US` resolution, left stopped
//! by `configure()` and armed by `start_ticking()`.
//!
//! Registers are written directly at their architectural addresses so
//! the scheduler does not need to thread peripheral ownership through
//! its API. The `SysTick` exception handler forwards into the bound
//! scheduler instance; binding happens once, during `Sked::init`.
//!
//! Everything here is bare-metal only. Hosted builds (unit tests) get
//! empty stubs with the same signatures and drive `Sked::tick`
//! directly instead.

use crate::scheduler::Sked;

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod regs {
    use crate::config::{SYSTEM_CLOCK_HZ, TICK_PERIOD_US};

    /// SysTick Control and Status Register.
    pub const SYST_CSR: *mut u32 = 0xE000_E010 as *mut u32;
    /// SysTick Reload Value Register.
    pub const SYST_RVR: *mut u32 = 0xE000_E014 as *mut u32;
    /// SysTick Current Value Register (any write clears to zero).
    pub const SYST_CVR: *mut u32 = 0xE000_E018 as *mut u32;
    /// Interrupt Control and State Register; bit 25 clears a pending
    /// SysTick exception.
    pub const ICSR: *mut u32 = 0xE000_ED04 as *mut u32;

    pub const CSR_ENABLE: u32 = 1 << 0;
    pub const CSR_TICKINT: u32 = 1 << 1;
    pub const CSR_CLKSOURCE: u32 = 1 << 2;
    pub const ICSR_PENDSTCLR: u32 = 1 << 25;

    /// Core cycles per scheduler tick, minus one for the reload.
    pub const fn reload() -> u32 {
        SYSTEM_CLOCK_HZ / 1_000_000 * TICK_PERIOD_US - 1
    }
}

// ---------------------------------------------------------------------------
// Scheduler binding
// ---------------------------------------------------------------------------

/// Scheduler instance the SysTick handler forwards into.
///
/// Set once during `Sked::init` (one scheduler per tick source), read
/// from exception context. The raw pointer is what makes nested
/// handler entry — the preemption mechanism — expressible at all.
#[cfg(all(target_arch = "arm", target_os = "none"))]
static mut SKED_PTR: *mut Sked = core::ptr::null_mut();

/// Bind `sked` as the instance the tick exception dispatches to.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub(crate) fn bind(sked: *mut Sked) {
    unsafe {
        SKED_PTR = sked;
    }
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub(crate) fn bind(_sked: *mut Sked) {}

// ---------------------------------------------------------------------------
// Timer controls
// ---------------------------------------------------------------------------

/// Program SysTick into periodic-compare mode at the tick resolution,
/// counter stopped and interrupt disabled until `start_ticking()`.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub(crate) fn configure() {
    use regs::*;
    unsafe {
        core::ptr::write_volatile(SYST_RVR, reload());
        core::ptr::write_volatile(SYST_CVR, 0);
        core::ptr::write_volatile(SYST_CSR, CSR_CLKSOURCE);
    }
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub(crate) fn configure() {}

/// Clear any pending tick, zero the counter and enable the tick
/// interrupt. Safe to call repeatedly.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub(crate) fn start_ticking() {
    use regs::*;
    unsafe {
        core::ptr::write_volatile(ICSR, ICSR_PENDSTCLR);
        core::ptr::write_volatile(SYST_CVR, 0);
        core::ptr::write_volatile(SYST_CSR, CSR_CLKSOURCE | CSR_TICKINT | CSR_ENABLE);
    }
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub(crate) fn start_ticking() {}

/// Stop the counter, disable the tick interrupt and drop anything
/// pending. Used by `reset` so a half-torn table can never be walked.
#[cfg(all(target_arch = "arm", target_os = "none"))]
pub(crate) fn stop_ticking() {
    use regs::*;
    unsafe {
        core::ptr::write_volatile(SYST_CSR, CSR_CLKSOURCE);
        core::ptr::write_volatile(ICSR, ICSR_PENDSTCLR);
        core::ptr::write_volatile(SYST_CVR, 0);
    }
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
pub(crate) fn stop_ticking() {}

// ---------------------------------------------------------------------------
// Tick exception handler
// ---------------------------------------------------------------------------

/// SysTick exception — the scheduler's tick entry point.
///
/// Fires once per `TICK_PERIOD_US` while ticking is enabled. The
/// cortex-m-rt vector table picks this symbol up directly.
///
/// # Safety
/// Re-entrancy is part of the design: the dispatch path re-enables
/// interrupts around callbacks, and a nested tick walks the same
/// scheduler through the same pointer. The priority guard in
/// `Sked::tick` is what bounds the nesting.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[no_mangle]
pub unsafe extern "C" fn SysTick() {
    let sked = SKED_PTR;
    if !sked.is_null() {
        (*sked).tick();
    }
}
