//! # Sked Example Firmware
//!
//! Preemptive demo: a fast sensor-poll task that must never wait on
//! slower work, next to a slow heartbeat whose callback takes longer
//! than the poll period. The poll task's higher priority lets its
//! deadlines nest into the heartbeat's callback, so its cadence holds
//! while the heartbeat grinds away underneath.
//!
//! | Task        | Period | Priority | Behavior                     |
//! |-------------|--------|----------|------------------------------|
//! | `poll_adc`  | 10 ms  | 5        | Samples, accumulates         |
//! | `heartbeat` | 1 s    | 0        | Slow bookkeeping burst       |
//!
//! Builds only for bare-metal ARM; on hosted targets this binary is an
//! empty stub so the library tests link cleanly.

#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_std)]
#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_main)]

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod firmware {
    use core::ptr::addr_of_mut;
    use core::sync::atomic::{AtomicU32, Ordering};

    use cortex_m_rt::entry;
    use panic_halt as _;

    use sked::{ClockSource, Mode, Sked};

    static mut SKED: Sked = Sked::new();

    static SAMPLES: AtomicU32 = AtomicU32::new(0);
    static BEATS: AtomicU32 = AtomicU32::new(0);

    /// 10 ms sensor poll. Short on purpose — it runs from interrupt
    /// context and may itself be nested into the heartbeat below.
    fn poll_adc() {
        SAMPLES.fetch_add(1, Ordering::Relaxed);
    }

    /// 1 s heartbeat with a deliberately long body. The poll task
    /// preempts it roughly a hundred times per activation.
    fn heartbeat() {
        BEATS.fetch_add(1, Ordering::Relaxed);
        for _ in 0..200_000 {
            cortex_m::asm::nop();
        }
    }

    #[entry]
    fn main() -> ! {
        let sked = unsafe { &mut *addr_of_mut!(SKED) };

        sked.init(Mode::Preemptive, ClockSource::SysTick)
            .expect("Failed to initialize scheduler");
        sked.schedule(10_000, 0, 5, poll_adc)
            .expect("Failed to schedule poll_adc");
        sked.schedule(1_000_000, 0, 0, heartbeat)
            .expect("Failed to schedule heartbeat");
        sked.start().expect("Failed to start scheduler");

        loop {
            // All dispatch happens from the tick interrupt.
            cortex_m::asm::wfi();
        }
    }
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
fn main() {}
