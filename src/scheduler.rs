//! Core scheduling logic.
//!
//! tickos is a fixed-table, round-robin, tick-driven scheduler:
//!
//! 1. **Tick** (from the SysTick handler): advance the global tick
//!    counter and wake every blocked task whose delay has expired. The
//!    handler then pends a context switch unconditionally, so every tick
//!    is a switch opportunity whether or not anything woke.
//! 2. **Selection** (from the PendSV handler): scan circularly from the
//!    slot after the current one; the first Ready user task wins. If a
//!    full lap finds nothing, fall back to the idle slot.
//! 3. **Delay** (from task context): mark the caller Blocked until a
//!    future tick and pend a switch.
//!
//! All of this is plain data manipulation on the [`Scheduler`] struct; the
//! register save/restore around it lives in [`arch`](crate::arch). The
//! struct is stored as a process-wide static in `kernel` and is touched
//! from exactly two contexts: exception handlers (tick, context switch)
//! and task code (delay). Task-context access must hold the interrupt-free
//! critical section from [`sync`](crate::sync); handler-context access
//! needs nothing more, because SysTick and PendSV share the lowest
//! exception priority and therefore never interleave with each other.

use crate::config::{IDLE_TASK, MAX_TASKS};
use crate::stack::FrameWriter;
use crate::task::{TaskControlBlock, TaskEntry, TaskState};

// ---------------------------------------------------------------------------
// Scheduler struct
// ---------------------------------------------------------------------------

/// The central scheduler state: the task table, the current-task index,
/// and the global tick counter.
///
/// Slot [`IDLE_TASK`] is registered by the kernel before any user task
/// and is permanently Ready. The table never shrinks and registration
/// stops once the scheduler starts.
pub struct Scheduler {
    /// Fixed-size task table. Index 0 is the idle task.
    pub tasks: [TaskControlBlock; MAX_TASKS],

    /// Index of the task currently executing on the CPU.
    pub current_task: usize,

    /// Number of registered slots (including the idle task).
    pub task_count: usize,

    /// Global tick counter, incremented once per SysTick interrupt.
    /// Wraps; delay deadlines use wrapping arithmetic to match.
    pub tick_count: u32,
}

impl Scheduler {
    /// xPSR for a task that has never run: only the Thumb bit. All
    /// condition flags and interrupt state bits clear.
    const INITIAL_XPSR: u32 = 1 << 24;

    /// EXC_RETURN sentinel stored in the bootstrapped LR slot: return to
    /// Thread mode, resume on the process stack, basic frame.
    const EXC_RETURN_THREAD_PSP: u32 = 0xFFFF_FFFD;

    /// Create an empty scheduler.
    pub const fn new() -> Self {
        Self {
            tasks: [TaskControlBlock::EMPTY; MAX_TASKS],
            current_task: IDLE_TASK,
            task_count: 0,
            tick_count: 0,
        }
    }

    /// Register a task in the next free slot and bootstrap its stack.
    ///
    /// The kernel registers the idle task first, so slot 0 is always the
    /// idle slot. Returns `Err(())` if the table is full. Must only be
    /// called before the scheduler starts.
    pub fn register(&mut self, entry: TaskEntry) -> Result<usize, ()> {
        if self.task_count >= MAX_TASKS {
            return Err(());
        }

        let id = self.task_count;
        self.tasks[id].init(id, entry);
        self.bootstrap_stack(id);
        self.task_count += 1;
        Ok(id)
    }

    /// Advance time by one tick and wake expired delays.
    ///
    /// Called from the SysTick handler. A blocked task wakes on the tick
    /// where the counter *equals* its wake tick; since this runs on every
    /// tick without exception, the equality test cannot be missed, and it
    /// stays correct across counter wrap-around.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);

        for slot in (IDLE_TASK + 1)..self.task_count {
            let tcb = &mut self.tasks[slot];
            if tcb.state == TaskState::Blocked && tcb.wake_tick == self.tick_count {
                tcb.unblock();
            }
        }
    }

    /// Select the next task to run, round-robin with idle fallback.
    ///
    /// Scans forward from the slot after the current one, wrapping, for
    /// at most one full lap; the first Ready user task becomes current.
    /// Equally-eligible tasks are therefore served in strict circular
    /// order. The idle slot is skipped during the scan and selected only
    /// when the lap completes empty-handed.
    pub fn pick_next(&mut self) -> usize {
        if self.task_count == 0 {
            return IDLE_TASK;
        }

        let current = self.current_task;
        let mut next = IDLE_TASK;
        for offset in 1..=self.task_count {
            let slot = (current + offset) % self.task_count;
            if slot == IDLE_TASK {
                continue;
            }
            if self.tasks[slot].is_ready() {
                next = slot;
                break;
            }
        }

        self.current_task = next;
        next
    }

    /// Block the current task for `ticks` ticks.
    ///
    /// The caller must hold the interrupt-free critical section and must
    /// pend a context switch when this returns `true`. A delay of 0 does
    /// not block; the pended switch alone gives up the CPU for one
    /// scheduling opportunity. The idle task never blocks; a delay
    /// requested from it is ignored.
    pub fn delay_current(&mut self, ticks: u32) -> bool {
        if self.current_task == IDLE_TASK {
            return false;
        }

        if ticks > 0 {
            let wake_tick = self.tick_count.wrapping_add(ticks);
            self.tasks[self.current_task].block_until(wake_tick);
        }
        true
    }

    /// Current global tick count.
    pub fn now(&self) -> u32 {
        self.tick_count
    }

    // -----------------------------------------------------------------------
    // Stack bootstrap
    // -----------------------------------------------------------------------

    /// Write the synthetic exception frame for a task that has never run.
    ///
    /// The first restore of this task must be indistinguishable from
    /// restoring a task that was interrupted mid-execution, so the frame
    /// matches exactly what the PendSV handler expects: the 8-word
    /// hardware-stacked half on top, the 8-word software-saved half below
    /// it. This is the single definition of the saved-context layout; the
    /// PendSV handler restores it, never re-derives it.
    ///
    /// ```text
    /// high addresses (stack top)
    ///   xPSR = INITIAL_XPSR      Thumb bit only
    ///   PC   = task entry point
    ///   LR   = EXC_RETURN_THREAD_PSP
    ///   R12  = 0
    ///   R3..R0 = 0               end of hardware-stacked half
    ///   R11..R4 = 0              software-saved half
    /// low addresses               <- stack_pointer after bootstrap
    /// ```
    fn bootstrap_stack(&mut self, id: usize) {
        let tcb = &mut self.tasks[id];
        let Some(entry) = tcb.entry else {
            return;
        };

        // SAFETY: a fresh stack region has room for the 16-word frame;
        // TaskStack::new checks the size at compile time.
        let mut frame = unsafe { FrameWriter::new(tcb.stack.top()) };

        // Hardware-stacked half, top down.
        frame.push(Self::INITIAL_XPSR);
        frame.push(entry as usize as u32);
        frame.push(Self::EXC_RETURN_THREAD_PSP);
        // R12, R3, R2, R1, R0
        for _ in 0..5 {
            frame.push(0);
        }

        // Software-saved half: R11 down to R4.
        for _ in 0..8 {
            frame.push(0);
        }

        tcb.stack_pointer = frame.sp();
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::STACK_SIZE;

    extern "C" fn spin() -> ! {
        loop {}
    }

    /// A scheduler with the idle task at slot 0 and `users` user tasks.
    fn sched_with_tasks(users: usize) -> Scheduler {
        let mut sched = Scheduler::new();
        sched.register(spin).unwrap();
        for _ in 0..users {
            sched.register(spin).unwrap();
        }
        sched
    }

    fn advance_to(sched: &mut Scheduler, tick: u32) {
        while sched.tick_count != tick {
            sched.tick();
        }
    }

    #[test]
    fn table_is_bounded() {
        let mut sched = sched_with_tasks(MAX_TASKS - 1);
        assert_eq!(sched.task_count, MAX_TASKS);
        assert_eq!(sched.register(spin), Err(()));
    }

    #[test]
    fn round_robin_visits_every_task_and_skips_idle() {
        let mut sched = sched_with_tasks(4);
        // Two full laps: strict circular order 1,2,3,4,1,2,3,4 and the
        // idle slot never appears while user tasks are ready.
        for expected in [1, 2, 3, 4, 1, 2, 3, 4] {
            assert_eq!(sched.pick_next(), expected);
            assert_eq!(sched.current_task, expected);
        }
    }

    #[test]
    fn sole_ready_task_wins_from_any_start() {
        let mut sched = sched_with_tasks(4);
        for slot in 1..=4 {
            if slot != 3 {
                sched.tasks[slot].block_until(100);
            }
        }
        for start in 0..5 {
            sched.current_task = start;
            assert_eq!(sched.pick_next(), 3);
        }
        // Re-selected on every lap, including when it is already current.
        assert_eq!(sched.pick_next(), 3);
    }

    #[test]
    fn idle_fallback_when_everything_is_blocked() {
        let mut sched = sched_with_tasks(4);
        advance_to(&mut sched, 5);
        for slot in 1..=4 {
            sched.tasks[slot].block_until(9);
        }

        // Idle on every selection until the deadline tick.
        while sched.tick_count < 8 {
            assert_eq!(sched.pick_next(), IDLE_TASK);
            sched.tick();
        }
        assert_eq!(sched.pick_next(), IDLE_TASK);

        sched.tick(); // tick 9 wakes all four
        assert_eq!(sched.pick_next(), 1);
    }

    #[test]
    fn delay_blocks_until_exact_deadline() {
        // Slot 2 delays 3 ticks at global tick 10, so it wakes at 13.
        let mut sched = sched_with_tasks(4);
        advance_to(&mut sched, 10);
        sched.current_task = 2;

        assert!(sched.delay_current(3));
        assert_eq!(sched.tasks[2].state, TaskState::Blocked);
        assert_eq!(sched.tasks[2].wake_tick, 13);

        // Ticks 11 and 12: slot 2 is skipped, the others rotate.
        sched.tick();
        assert_eq!(sched.pick_next(), 3);
        sched.tick();
        assert_eq!(sched.pick_next(), 4);
        assert_eq!(sched.tasks[2].state, TaskState::Blocked);

        // Tick 13: the tick handler wakes slot 2 before selection.
        sched.tick();
        assert_eq!(sched.tasks[2].state, TaskState::Ready);
        sched.current_task = 1;
        assert_eq!(sched.pick_next(), 2);
    }

    #[test]
    fn staggered_wakeups_fill_gaps_with_idle() {
        let mut sched = sched_with_tasks(4);
        advance_to(&mut sched, 15);
        for (i, deadline) in [(1, 20), (2, 21), (3, 22), (4, 23)] {
            sched.tasks[i].block_until(deadline);
        }

        // Nothing ready until tick 20.
        while sched.tick_count < 19 {
            assert_eq!(sched.pick_next(), IDLE_TASK);
            sched.tick();
        }

        // Each task wakes on its own tick and is selected immediately.
        for expected in [1, 2, 3, 4] {
            sched.tick();
            assert_eq!(sched.pick_next(), expected);
            // Woken task goes back to sleep right away.
            assert!(sched.delay_current(10));
        }
    }

    #[test]
    fn zero_delay_yields_without_blocking() {
        let mut sched = sched_with_tasks(2);
        sched.current_task = 1;
        // A switch is still requested, but the task stays eligible.
        assert!(sched.delay_current(0));
        assert_eq!(sched.tasks[1].state, TaskState::Ready);
    }

    #[test]
    fn idle_task_cannot_block() {
        let mut sched = sched_with_tasks(2);
        sched.current_task = IDLE_TASK;
        assert!(!sched.delay_current(50));
        assert_eq!(sched.tasks[IDLE_TASK].state, TaskState::Ready);
    }

    #[test]
    fn delay_across_tick_wraparound() {
        let mut sched = sched_with_tasks(1);
        sched.tick_count = u32::MAX - 1;
        sched.current_task = 1;

        assert!(sched.delay_current(3));
        assert_eq!(sched.tasks[1].wake_tick, 1);

        sched.tick(); // u32::MAX
        assert_eq!(sched.tasks[1].state, TaskState::Blocked);
        sched.tick(); // 0
        assert_eq!(sched.tasks[1].state, TaskState::Blocked);
        sched.tick(); // 1 == wake_tick
        assert_eq!(sched.tasks[1].state, TaskState::Ready);
    }

    #[test]
    fn bootstrap_frame_resumes_at_entry() {
        // Round-trip property: a simulated restore of the bootstrapped
        // frame must land on the entry point in Thumb state with every
        // general-purpose register zeroed.
        let mut sched = Scheduler::new();
        sched.register(spin).unwrap();
        let tcb = &sched.tasks[0];

        let sp = tcb.stack_pointer;
        assert!(!sp.is_null());
        // 16 words below the stack top.
        assert_eq!(tcb.stack.top() as usize - sp as usize, 16 * 4);

        let frame: [u32; 16] = core::array::from_fn(|i| unsafe { sp.add(i).read() });
        // R4-R11, then R0-R3 and R12: all zero.
        assert!(frame[..13].iter().all(|&word| word == 0));
        // LR slot holds the exception-return sentinel.
        assert_eq!(frame[13], 0xFFFF_FFFD);
        // PC is the entry point, xPSR has only the Thumb bit.
        assert_eq!(frame[14], spin as usize as u32);
        assert_eq!(frame[15], 1 << 24);
    }

    #[test]
    fn stacks_do_not_overlap() {
        let sched = sched_with_tasks(MAX_TASKS - 1);
        for a in 0..MAX_TASKS {
            let top = sched.tasks[a].stack.top() as usize;
            let base = top - STACK_SIZE;
            for b in 0..MAX_TASKS {
                if a == b {
                    continue;
                }
                let other_top = sched.tasks[b].stack.top() as usize;
                assert!(other_top <= base || other_top - STACK_SIZE >= top);
            }
        }
    }
}
