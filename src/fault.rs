//! Fail-stop fault handlers.
//!
//! `kernel::start` splits memory, bus and usage faults out of HardFault
//! (see [`arch::cortex_m4::enable_fault_monitoring`]); the handlers here
//! report what happened over semihosting and park the core permanently.
//! With no memory protection between tasks, any fault may mean corrupted
//! task state, so there is no recovery path, not even a restart.
//!
//! [`arch::cortex_m4::enable_fault_monitoring`]: crate::arch::cortex_m4::enable_fault_monitoring

use cortex_m_rt::{exception, ExceptionFrame};
use cortex_m_semihosting::hprintln;

/// Configurable Fault Status Register.
const CFSR: *const u32 = 0xE000_ED28 as *const u32;
/// MemManage Fault Address Register.
const MMFAR: *const u32 = 0xE000_ED34 as *const u32;
/// BusFault Address Register.
const BFAR: *const u32 = 0xE000_ED38 as *const u32;

#[exception]
unsafe fn HardFault(frame: &ExceptionFrame) -> ! {
    let _ = hprintln!("HARD FAULT: {:#?}", frame);
    let _ = hprintln!("  CFSR = {:#010x}", core::ptr::read_volatile(CFSR));
    halt();
}

#[exception]
unsafe fn MemoryManagement() {
    let _ = hprintln!(
        "MEMORY FAULT: CFSR = {:#010x}, MMFAR = {:#010x}",
        core::ptr::read_volatile(CFSR),
        core::ptr::read_volatile(MMFAR)
    );
    halt();
}

#[exception]
unsafe fn BusFault() {
    let _ = hprintln!(
        "BUS FAULT: CFSR = {:#010x}, BFAR = {:#010x}",
        core::ptr::read_volatile(CFSR),
        core::ptr::read_volatile(BFAR)
    );
    halt();
}

#[exception]
unsafe fn UsageFault() {
    let _ = hprintln!(
        "USAGE FAULT: CFSR = {:#010x}",
        core::ptr::read_volatile(CFSR)
    );
    halt();
}

/// Park the core forever.
fn halt() -> ! {
    cortex_m::interrupt::disable();
    loop {
        cortex_m::asm::wfi();
    }
}
