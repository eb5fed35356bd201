//! Host stand-ins for the Cortex-M4 port.
//!
//! Lets the kernel and the scheduler unit tests compile off-target. None
//! of these perform any hardware action.

pub fn configure_systick(_syst: &mut cortex_m::peripheral::SYST) {}

pub fn set_exception_priorities() {}

pub fn enable_fault_monitoring() {}

pub fn pend_context_switch() {}

/// # Safety
///
/// Never actually launches anything; present only so `kernel::start`
/// type-checks on the host.
pub unsafe fn start_first_task(_psp: *const u32) -> ! {
    unimplemented!("task launch only exists on the target")
}
