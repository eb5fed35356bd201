//! Per-task stack memory.
//!
//! Each task owns one [`TaskStack`] embedded in its control block. The
//! regions are therefore disjoint by construction; nothing checks at
//! runtime that a task stays inside its region. A task that overruns its
//! stack corrupts its neighbour and eventually takes a hardware fault,
//! which is the detection mechanism (see `fault`).

use core::cell::UnsafeCell;

use crate::config::STACK_SIZE;

/// A task's private stack region.
///
/// The Arm stack is full-descending: it grows downward from [`top()`],
/// and the top address itself is never written. Aligned to 8 bytes as
/// required by AAPCS.
///
/// [`top()`]: TaskStack::top
#[repr(align(8))]
pub struct TaskStack {
    contents: UnsafeCell<[u8; STACK_SIZE]>,
}

impl TaskStack {
    /// Create a zero-filled stack region.
    pub const fn new() -> Self {
        assert!(STACK_SIZE % 8 == 0);
        Self {
            contents: UnsafeCell::new([0u8; STACK_SIZE]),
        }
    }

    /// Get the top of the stack.
    pub const fn top(&self) -> *mut u32 {
        // SAFETY: one past the buffer is a valid address to form, and a
        // full-descending stack only ever writes below it
        unsafe { self.contents.get().add(1) as *mut u32 }
    }
}

// SAFETY: the region only hands out raw pointers into itself; all writes
// go through the bootstrap and context-switch paths, which are serialized
// by the single-core interrupt discipline.
unsafe impl Sync for TaskStack {}

impl Default for TaskStack {
    fn default() -> Self {
        TaskStack::new()
    }
}

/// Helper for writing words into a full-descending stack.
///
/// Used by the stack bootstrap to lay down the synthetic exception frame
/// in descending-address order.
pub(crate) struct FrameWriter(*mut u32);

impl FrameWriter {
    /// Start a frame at the given stack top.
    ///
    /// Never writes to the given pointer itself, only below it.
    ///
    /// # Safety
    ///
    /// There must be enough free space below `stack_top` for every word
    /// that will be pushed.
    pub(crate) unsafe fn new(stack_top: *mut u32) -> FrameWriter {
        FrameWriter(stack_top)
    }

    /// Push one word, decrementing the stack pointer first.
    pub(crate) fn push(&mut self, value: u32) {
        self.0 = unsafe { self.0.offset(-1) };
        unsafe {
            self.0.write_volatile(value);
        }
    }

    /// The current (post-push) stack pointer.
    pub(crate) fn sp(&self) -> *mut u32 {
        self.0
    }
}
