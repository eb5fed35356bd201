//! Kernel lifecycle and public API.
//!
//! The kernel owns the one global [`Scheduler`] and exposes the whole of
//! the task-facing surface: registration before start, the delay
//! primitive, and the tick clock.
//!
//! ## Startup sequence
//!
//! ```text
//! reset handler (cortex-m-rt, sets up MSP, the scheduler stack)
//!   └─► main()
//!         ├─► kernel::init()        ← scheduler + idle task in slot 0
//!         ├─► kernel::create_task() ← user tasks (×N), stacks bootstrapped
//!         └─► kernel::start()       ← no return
//!               ├─► fault monitoring on
//!               ├─► SysTick configured
//!               ├─► PendSV/SysTick priorities set
//!               └─► PSP switch-over, branch to the first task
//! ```

use crate::arch::port;
use crate::scheduler::Scheduler;
use crate::sync;
use crate::task::TaskEntry;

// ---------------------------------------------------------------------------
// Global scheduler instance
// ---------------------------------------------------------------------------

/// The one scheduler. Lives for the duration of the firmware.
static mut SCHEDULER: Scheduler = Scheduler::new();

/// Raw pointer to the scheduler for the exception handlers, which cannot
/// take references. Set once in [`init`], read from handler context.
pub static mut SCHEDULER_PTR: *mut Scheduler = core::ptr::null_mut();

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Initialize the kernel: publish the scheduler pointer and put the idle
/// task into slot [`IDLE_TASK`](crate::config::IDLE_TASK).
///
/// Must be called exactly once, from the main thread, before any
/// [`create_task`] or [`start`].
pub fn init() {
    unsafe {
        SCHEDULER_PTR = core::ptr::addr_of_mut!(SCHEDULER);
    }
    // The table is empty at this point, so the idle task necessarily
    // lands in slot 0 and registration cannot fail.
    let _ = sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).register(idle_task) });
}

/// Register a user task.
///
/// Only valid between [`init`] and [`start`]; the table is fixed once the
/// scheduler is running. Returns the task's slot index, or `Err(())` if
/// every slot is taken.
pub fn create_task(entry: TaskEntry) -> Result<usize, ()> {
    sync::critical_section(|_cs| unsafe { (*SCHEDULER_PTR).register(entry) })
}

/// Start scheduling. **Does not return.**
///
/// Enables fault monitoring, configures the tick source, drops PendSV and
/// SysTick to the lowest priority, selects the first task and branches
/// into it on the process stack. Interrupts stay disabled until the
/// launch sequence switches stacks, so no tick can observe the system
/// half-initialized.
pub fn start(mut core_peripherals: cortex_m::Peripherals) -> ! {
    cortex_m::interrupt::disable();

    port::enable_fault_monitoring();
    port::configure_systick(&mut core_peripherals.SYST);
    port::set_exception_priorities();

    let first_sp = unsafe {
        let sched = &mut *SCHEDULER_PTR;
        let first = sched.pick_next();
        sched.tasks[first].stack_pointer as *const u32
    };

    // SAFETY: `first_sp` is a bootstrapped frame and the selector just
    // made its owner the current task.
    unsafe { port::start_first_task(first_sp) }
}

/// Delay the calling task for `ticks` scheduler ticks.
///
/// Marks the caller Blocked until the global tick reaches
/// `now() + ticks` and requests a context switch. The switch is only
/// *pended* inside the critical section; it fires once interrupts are
/// re-enabled on return, so execution continues briefly past the call
/// site before the task is actually descheduled. `delay(0)` still gives
/// up the CPU for one scheduling opportunity. Calling this from the idle
/// task does nothing.
pub fn delay(ticks: u32) {
    sync::critical_section(|_cs| unsafe {
        if (*SCHEDULER_PTR).delay_current(ticks) {
            port::pend_context_switch();
        }
    });
}

/// Current global tick count, or 0 before [`init`].
///
/// Read inside a critical section: the counter is incremented from tick
/// context, and a task-context read racing that increment must not tear.
pub fn now() -> u32 {
    sync::critical_section(|_cs| unsafe {
        if SCHEDULER_PTR.is_null() {
            0
        } else {
            (*SCHEDULER_PTR).now()
        }
    })
}

// ---------------------------------------------------------------------------
// Idle task
// ---------------------------------------------------------------------------

/// Slot-0 task: permanently Ready, selected only when every user task is
/// blocked. Sleeps the core until the next interrupt.
extern "C" fn idle_task() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
