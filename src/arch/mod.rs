//! Hardware port layer.
//!
//! Everything that manipulates raw registers, the process stack pointer,
//! or exception entry/exit lives here. The rest of the kernel only sees
//! the `port` alias, so the scheduler logic unit-tests on the host
//! against the stub port.

#[cfg(target_arch = "arm")]
pub mod cortex_m4;

#[cfg(target_arch = "arm")]
pub use cortex_m4 as port;

#[cfg(not(target_arch = "arm"))]
pub mod stub;

#[cfg(not(target_arch = "arm"))]
pub use stub as port;
