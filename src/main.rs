//! Demo firmware: four placeholder tasks on the round-robin scheduler.
//!
//! Each task stands in for a real workload; the kernel neither knows nor
//! cares what they compute, only that they eventually call
//! [`kernel::delay`] or get preempted by the tick.
//!
//! | Task      | Period     | Behavior                               |
//! |-----------|------------|----------------------------------------|
//! | `sensor`  | 10 ticks   | short burst of work, then sleeps       |
//! | `control` | 50 ticks   | medium burst, then sleeps              |
//! | `logger`  | 1000 ticks | prints the tick clock once per second  |
//! | `churn`   | 0 ticks    | busy loop that only yields             |
//!
//! With `churn` never blocking, the idle task runs only in the gaps where
//! every other task is asleep and `churn` has just yielded.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg(target_arch = "arm")]
mod firmware {
    use cortex_m_rt::entry;
    use cortex_m_semihosting::hprintln;
    use panic_halt as _;

    use tickos::config::{MAX_TASKS, TICK_HZ};
    use tickos::kernel;

    extern "C" fn sensor_task() -> ! {
        loop {
            // Stand-in for sampling work.
            let mut acc: u32 = 0;
            for i in 0..500u32 {
                acc = acc.wrapping_add(i);
            }
            core::hint::black_box(acc);
            kernel::delay(10);
        }
    }

    extern "C" fn control_task() -> ! {
        loop {
            let mut acc: u32 = 0;
            for i in 0..5_000u32 {
                acc = acc.wrapping_mul(31).wrapping_add(i);
            }
            core::hint::black_box(acc);
            kernel::delay(50);
        }
    }

    extern "C" fn logger_task() -> ! {
        loop {
            let _ = hprintln!("[{}] logger alive", kernel::now());
            kernel::delay(TICK_HZ);
        }
    }

    /// Never blocks; relies on preemption and zero-tick yields.
    extern "C" fn churn_task() -> ! {
        let mut counter: u32 = 0;
        loop {
            counter = counter.wrapping_add(1);
            if counter % 100_000 == 0 {
                kernel::delay(0);
            }
        }
    }

    #[entry]
    fn main() -> ! {
        let cp = cortex_m::Peripherals::take().unwrap();

        let _ = hprintln!("tickos: {} Hz tick, {} slots", TICK_HZ, MAX_TASKS);

        kernel::init();

        kernel::create_task(sensor_task).expect("register sensor_task");
        kernel::create_task(control_task).expect("register control_task");
        kernel::create_task(logger_task).expect("register logger_task");
        kernel::create_task(churn_task).expect("register churn_task");

        kernel::start(cp)
    }
}

#[cfg(not(target_arch = "arm"))]
fn main() {}
