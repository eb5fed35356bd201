//! Compile-time configuration.
//!
//! Every limit in tickos is fixed at compile time. There is no heap, no
//! dynamic task creation, and no runtime reconfiguration: the constants
//! below fully determine the memory footprint of the kernel.

/// Total number of task slots, including the idle slot.
/// Bounds the static TCB array. Each slot reserves `STACK_SIZE` bytes
/// of RAM whether or not it is used.
pub const MAX_TASKS: usize = 8;

/// Slot reserved for the idle task. Always Ready, never blocked, and
/// only selected when no user task is runnable.
pub const IDLE_TASK: usize = 0;

/// Scheduler tick frequency in Hz. Each tick advances the global tick
/// counter, wakes tasks whose delay has expired, and forces a
/// round-robin switch opportunity.
pub const TICK_HZ: u32 = 1_000;

/// Per-task stack size in bytes. Must hold the deepest call chain plus
/// the 32-byte hardware exception frame and the 32-byte software-saved
/// context (R4-R11). Must be a multiple of 8 (AAPCS alignment).
pub const STACK_SIZE: usize = 1024;

/// Core clock frequency in Hz (STM32F4 on the 16 MHz HSI).
///
/// The SysTick reload value is `SYSTEM_CLOCK_HZ / TICK_HZ - 1`; a tick
/// rate that does not evenly divide the core clock is silently rounded
/// to the nearest achievable period.
pub const SYSTEM_CLOCK_HZ: u32 = 16_000_000;
