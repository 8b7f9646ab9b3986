//! # Clock Source Ports
//!
//! Hardware boundary of the scheduler. A port must deliver a periodic
//! tick at a fixed resolution and expose stopped-configure, start
//! (clear pending, zero counter, enable interrupt) and stop controls.
//! Currently the only port is the Cortex-M SysTick; further sources
//! slot in as sibling modules.

pub mod systick;
