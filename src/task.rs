//! Task control blocks.
//!
//! One [`TaskControlBlock`] per slot, held in a fixed array inside the
//! scheduler: no heap, no insertion or removal. Slot 0 is the idle task;
//! every other slot is a user task registered before the scheduler starts.
//! Task bodies are non-returning functions; a task lives for the whole
//! lifetime of the firmware.

use crate::stack::TaskStack;

/// A task body: no arguments, never returns.
///
/// The kernel assumes nothing about what a task does, only that it either
/// calls [`kernel::delay`](crate::kernel::delay) or gets preempted by the
/// tick.
pub type TaskEntry = extern "C" fn() -> !;

// ---------------------------------------------------------------------------
// Task state machine
// ---------------------------------------------------------------------------

/// Scheduling state of a task.
///
/// There is no separate `Running` state: the running task is the Ready
/// task at the scheduler's current index. A Blocked task is excluded from
/// selection until the global tick reaches its wake tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Schedulable (possibly currently executing).
    Ready,
    /// Waiting out a delay; ineligible for selection.
    Blocked,
}

// ---------------------------------------------------------------------------
// Task Control Block
// ---------------------------------------------------------------------------

/// Per-slot task bookkeeping.
///
/// The stack region lives inline in the TCB, so the per-task regions are
/// disjoint by construction. `stack_pointer` always points at a complete
/// saved register image while the task is not running: the bootstrap
/// writes the first image, and afterwards only the context-switch handler
/// touches the field.
pub struct TaskControlBlock {
    /// Slot index in the scheduler's task array.
    pub id: usize,

    /// Current scheduling state.
    pub state: TaskState,

    /// Global tick at which a Blocked task becomes Ready again.
    /// Meaningful only while `state == Blocked`.
    pub wake_tick: u32,

    /// Entry point, consumed once by the stack bootstrap.
    pub entry: Option<TaskEntry>,

    /// Saved process stack pointer (PSP). Points into `stack`.
    pub stack_pointer: *mut u32,

    /// Private stack region for this task.
    pub stack: TaskStack,

    /// Whether this slot holds a registered task.
    pub active: bool,
}

// SAFETY: the TCB holds a raw pointer into its own stack region. All
// mutation happens either before the scheduler starts or under the
// single-core interrupt discipline described in `scheduler`.
unsafe impl Send for TaskControlBlock {}
unsafe impl Sync for TaskControlBlock {}

impl TaskControlBlock {
    /// An unregistered slot, for initializing the static array.
    pub const EMPTY: TaskControlBlock = TaskControlBlock {
        id: 0,
        state: TaskState::Blocked,
        wake_tick: 0,
        entry: None,
        stack_pointer: core::ptr::null_mut(),
        stack: TaskStack::new(),
        active: false,
    };

    /// Claim this slot for a task. The stack frame is bootstrapped
    /// separately by the scheduler.
    pub fn init(&mut self, id: usize, entry: TaskEntry) {
        self.id = id;
        self.state = TaskState::Ready;
        self.wake_tick = 0;
        self.entry = Some(entry);
        self.active = true;
    }

    /// Block this task until the global tick equals `wake_tick`.
    pub fn block_until(&mut self, wake_tick: u32) {
        self.wake_tick = wake_tick;
        self.state = TaskState::Blocked;
    }

    /// Make this task schedulable again.
    pub fn unblock(&mut self) {
        self.state = TaskState::Ready;
    }

    /// Is this slot eligible for selection?
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.active && self.state == TaskState::Ready
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn spin() -> ! {
        loop {}
    }

    #[test]
    fn empty_slot_is_not_schedulable() {
        let tcb = TaskControlBlock::EMPTY;
        assert!(!tcb.active);
        assert!(!tcb.is_ready());
    }

    #[test]
    fn init_makes_slot_ready() {
        let mut tcb = TaskControlBlock::EMPTY;
        tcb.init(3, spin);
        assert!(tcb.active);
        assert_eq!(tcb.id, 3);
        assert_eq!(tcb.state, TaskState::Ready);
        assert!(tcb.entry.is_some());
        assert!(tcb.is_ready());
    }

    #[test]
    fn block_and_unblock() {
        let mut tcb = TaskControlBlock::EMPTY;
        tcb.init(1, spin);

        tcb.block_until(42);
        assert_eq!(tcb.state, TaskState::Blocked);
        assert_eq!(tcb.wake_tick, 42);
        assert!(!tcb.is_ready());

        tcb.unblock();
        assert_eq!(tcb.state, TaskState::Ready);
        assert!(tcb.is_ready());
    }
}
