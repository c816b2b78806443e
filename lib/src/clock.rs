//! Monotonic clock hook.
//!
//! The file layer only needs coarse timestamps (test timing, log lines), so
//! the platform registers a single source function at boot. Until that
//! happens every accessor returns `0`.

use core::sync::atomic::{AtomicPtr, Ordering};

/// Returns nanoseconds since boot.
pub type ClockSource = fn() -> u64;

static SOURCE: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Install the platform clock. Later registrations replace earlier ones.
pub fn clock_register_source(source: ClockSource) {
    SOURCE.store(source as *mut (), Ordering::Release);
}

/// Returns the monotonic clock value in nanoseconds since boot.
#[inline]
pub fn monotonic_ns() -> u64 {
    let ptr = SOURCE.load(Ordering::Acquire);
    if ptr.is_null() {
        return 0;
    }
    // SAFETY: only `clock_register_source` stores into SOURCE, and it only
    // stores `ClockSource` fn pointers.
    let source: ClockSource = unsafe { core::mem::transmute(ptr) };
    source()
}

/// Returns system uptime in milliseconds.
#[inline]
pub fn uptime_ms() -> u64 {
    monotonic_ns() / 1_000_000
}
