//! Cortex-M4 port layer.
//!
//! Context switching via PendSV, the SysTick tick source, fault
//! monitoring enablement, and the first-task launch sequence.
//!
//! ## Context switch mechanism
//!
//! The Cortex-M split-stack model gives handlers their own stack: MSP is
//! the scheduler/exception stack, PSP is the running task's stack. On
//! exception entry the hardware stacks R0-R3, R12, LR, PC and xPSR onto
//! the process stack; the PendSV handler saves and restores the other
//! half (R4-R11) by hand, which together form the full 16-word context
//! image laid down by the stack bootstrap.
//!
//! ## Exception priorities
//!
//! SysTick and PendSV both run at the lowest priority. PendSV therefore
//! never preempts another handler, never interleaves with itself, and is
//! only ever *pended*: it runs at the next point no higher-priority
//! exception is active and interrupts are enabled.

use core::arch::{asm, naked_asm};

use cortex_m::peripheral::syst::SystClkSource;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_HZ};

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Configure SysTick as the tick source, firing at [`TICK_HZ`].
///
/// A tick rate that does not divide the core clock produces a silently
/// rounded period.
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// Exception priorities and fault monitoring
// ---------------------------------------------------------------------------

/// Set PendSV and SysTick to the lowest exception priority.
pub fn set_exception_priorities() {
    // System Handler Priority Register 3 (SHPR3):
    // bits [23:16] = PendSV, bits [31:24] = SysTick
    const SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;
    unsafe {
        let val = core::ptr::read_volatile(SHPR3);
        core::ptr::write_volatile(SHPR3, val | (0xFF << 16) | (0xFF << 24));
    }
}

/// Split memory, bus and usage faults out of HardFault.
///
/// Sets MEMFAULTENA, BUSFAULTENA and USGFAULTENA in the SHCSR so the
/// dedicated handlers in [`fault`](crate::fault) get them. Called once
/// during `kernel::start`.
pub fn enable_fault_monitoring() {
    // System Handler Control and State Register, enable bits [18:16]
    const SHCSR: *mut u32 = 0xE000_ED24 as *mut u32;
    unsafe {
        let val = core::ptr::read_volatile(SHCSR);
        core::ptr::write_volatile(SHCSR, val | (0b111 << 16));
    }
}

// ---------------------------------------------------------------------------
// Context-switch request
// ---------------------------------------------------------------------------

/// Mark the PendSV exception pending.
///
/// Never runs the handler synchronously: the switch happens whenever the
/// processor next takes the exception. Requesting it while already
/// pending has no additional effect.
#[inline]
pub fn pend_context_switch() {
    // ICSR, PENDSVSET = bit 28
    const ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
    unsafe {
        core::ptr::write_volatile(ICSR, 1 << 28);
    }
}

// ---------------------------------------------------------------------------
// First task launch
// ---------------------------------------------------------------------------

/// Switch Thread mode onto the process stack and branch into the first
/// task. Called once from `kernel::start`, with interrupts disabled and
/// `psp` pointing at a bootstrapped context image. Never returns.
///
/// # Safety
///
/// `psp` must point at a full 16-word frame produced by the stack
/// bootstrap, and the scheduler's current task must be the one that owns
/// it.
pub unsafe fn start_first_task(psp: *const u32) -> ! {
    asm!(
        // Skip the software-saved half (R4-R11, 8 words); the hardware
        // half is consumed below.
        "adds r0, #32",
        "msr psp, r0",

        // CONTROL.SPSEL = 1: Thread mode uses PSP from here on. MSP
        // stays reserved for the handlers.
        "movs r0, #2",
        "msr control, r0",
        "isb",

        // Unpack the hardware half of the frame by hand, since this is
        // a branch rather than a real exception return.
        "pop {{r0-r3, r12}}",
        "pop {{r4}}", // LR slot (EXC_RETURN sentinel, unused here)
        "pop {{r5}}", // PC = task entry point
        "pop {{r6}}", // xPSR (the processor sets its own)

        "cpsie i",
        "bx r5",

        in("r0") psp,
        options(noreturn)
    );
}

// ---------------------------------------------------------------------------
// PendSV handler (context switch)
// ---------------------------------------------------------------------------

/// PendSV exception handler: the context switch itself.
///
/// 1. Push R4-R11 onto the outgoing task's stack (PSP)
/// 2. Store the grown stack pointer into the outgoing TCB
/// 3. Run the round-robin selector
/// 4. Load the incoming TCB's stack pointer
/// 5. Pop R4-R11 from the incoming stack and set PSP
/// 6. Exception-return; the hardware restores the remaining frame
///
/// There is no error path: a malformed stack image takes a hardware
/// fault, which lands in the fail-stop handlers in `fault`.
///
/// # Safety
///
/// Naked handler entered by the NVIC; it must follow the Cortex-M
/// exception entry/exit convention exactly.
#[no_mangle]
#[unsafe(naked)]
pub unsafe extern "C" fn PendSV() {
    naked_asm!(
        // --- Save outgoing context ---
        "mrs r0, psp",
        "stmdb r0!, {{r4-r11}}",
        "bl {save}",

        // --- Pick and load incoming context ---
        "bl {next}", // returns the new PSP in r0
        "ldmia r0!, {{r4-r11}}",
        "msr psp, r0",

        // Return to Thread mode on the process stack, basic frame.
        "ldr r0, =0xFFFFFFFD",
        "bx r0",

        save = sym save_outgoing_context,
        next = sym select_next_context,
    );
}

/// Persist the outgoing task's grown stack pointer. Called from PendSV
/// between the register save and the selection.
unsafe extern "C" fn save_outgoing_context(psp: *mut u32) {
    let sched = &mut *crate::kernel::SCHEDULER_PTR;
    let current = sched.current_task;
    if current < sched.task_count {
        sched.tasks[current].stack_pointer = psp;
    }
}

/// Run the task selector and hand PendSV the incoming stack pointer.
unsafe extern "C" fn select_next_context() -> *mut u32 {
    let sched = &mut *crate::kernel::SCHEDULER_PTR;
    let next = sched.pick_next();
    sched.tasks[next].stack_pointer
}

// ---------------------------------------------------------------------------
// SysTick handler
// ---------------------------------------------------------------------------

/// SysTick exception handler: the scheduler tick.
///
/// Advances the global tick, wakes expired delays, and pends a context
/// switch unconditionally. Every tick is a switch opportunity, which is
/// what makes the round-robin fair.
#[no_mangle]
pub unsafe extern "C" fn SysTick() {
    let sched = &mut *crate::kernel::SCHEDULER_PTR;
    sched.tick();
    pend_context_switch();
}
