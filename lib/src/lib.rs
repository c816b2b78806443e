#![no_std]

#[cfg(test)]
extern crate std;

pub mod clock;
pub mod klog;
pub mod testing;

#[doc(hidden)]
pub use paste;

pub use clock::{clock_register_source, monotonic_ns, uptime_ms};
pub use klog::{
    KlogLevel, klog_get_level, klog_init, klog_is_enabled, klog_register_backend, klog_set_level,
};
