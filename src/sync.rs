//! Interrupt-masking critical section.
//!
//! The scheduler's shared state (task table, tick counter, current-task
//! index) is touched from task context and from the tick and switch
//! handlers. On a single core the only mutual exclusion task context
//! needs is masking interrupts for the duration of its access, which also
//! keeps the tick from firing mid-mutation. Handler context needs nothing
//! extra: equal-priority exceptions cannot preempt each other.

use cortex_m::interrupt;

/// Run `f` with all maskable interrupts disabled.
///
/// Keep the body short; nothing is serviced, including the scheduler
/// tick, until it returns.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}
