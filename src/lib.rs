//! # tickos
//!
//! A minimal preemptive round-robin scheduler for single-core ARM
//! Cortex-M4 microcontrollers with no MMU.
//!
//! tickos partitions a fixed block of on-chip RAM into private task
//! stacks, time-slices a compile-time-sized set of tasks on a periodic
//! tick, and gives tasks exactly one blocking primitive: delay for a
//! number of ticks. There are no priorities, no queues or semaphores, no
//! dynamic task creation and no memory protection.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 Application tasks                    │
//! ├──────────────────────────────────────────────────────┤
//! │              Kernel API (kernel.rs)                  │
//! │    init() · create_task() · start() · delay()        │
//! ├───────────────────────┬──────────────────────────────┤
//! │  Scheduler            │  Sync                        │
//! │  scheduler.rs         │  sync.rs                     │
//! │  ─ tick()             │  ─ critical_section()        │
//! │  ─ pick_next()        │                              │
//! │  ─ delay_current()    │                              │
//! ├───────────────────────┴──────────────────────────────┤
//! │         Task model (task.rs, stack.rs)               │
//! │     TCB · TaskState · private stack regions          │
//! ├──────────────────────────────────────────────────────┤
//! │         Port (arch/cortex_m4.rs, fault.rs)           │
//! │  PendSV · SysTick · first-task launch · fault halt   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling model
//!
//! All switching goes through the PendSV exception, pended either by the
//! tick (every tick, unconditionally) or by a task calling
//! [`kernel::delay`]. The selector rotates circularly through the Ready
//! user tasks; when all of them are blocked, the idle task in slot 0
//! soaks up the CPU with `wfi`.
//!
//! ## Memory model
//!
//! - No heap, no `alloc`: all state is statically allocated
//! - Fixed TCB array `[TaskControlBlock; MAX_TASKS]`, stacks inline
//! - Shared state guarded by interrupt masking, never by locks: a
//!   blocking lock is unusable inside an exception handler on one core

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod config;
#[cfg(target_arch = "arm")]
pub mod fault;
pub mod kernel;
pub mod scheduler;
pub mod stack;
pub mod sync;
pub mod task;
