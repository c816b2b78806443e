//! Syscall number definitions (kernel-userland ABI).
//!
//! This module is the **single source of truth** for the file syscall
//! numbers. Both kernel and userland import from here to ensure ABI
//! consistency.
//!
//! # Adding New Syscalls
//!
//! 1. Add the constant here with the next available number
//! 2. Use the `SYSCALL_` prefix for consistency
//! 3. Add the handler to the dispatch table in `core/src/syscall/handlers.rs`
//!
//! # Return convention
//!
//! A non-negative return value is the result. A negative value is the
//! negated errno from [`crate::errno`].

// =============================================================================
// File descriptors
// =============================================================================

/// Open a path.
///
/// # Arguments (via registers)
/// * rdi (arg0): pointer to NUL-terminated path
/// * rsi (arg1): open flags (`O_*`)
/// * rdx (arg2): creation mode bits
///
/// # Returns
/// * lowest free descriptor on success
/// * -EMFILE / -ENFILE when the process / system table is full
pub const SYSCALL_OPEN: u64 = 14;
pub const SYSCALL_CLOSE: u64 = 15;
pub const SYSCALL_READ: u64 = 16;
pub const SYSCALL_WRITE: u64 = 17;

/// Reposition the offset of an open file.
///
/// # Arguments (via registers)
/// * rdi (arg0): descriptor
/// * rsi (arg1): signed 64-bit position
/// * rdx (arg2): whence (`SEEK_SET`, `SEEK_CUR`, `SEEK_END`)
///
/// # Returns
/// * new offset on success
/// * -ESPIPE for non-seekable objects, -EINVAL for bad whence or a negative result
pub const SYSCALL_LSEEK: u64 = 18;
pub const SYSCALL_FSTAT: u64 = 19;

/// Duplicate arg0 onto the lowest free descriptor.
pub const SYSCALL_DUP: u64 = 20;

/// Duplicate arg0 onto exactly arg1, closing arg1 first if it is open.
pub const SYSCALL_DUP2: u64 = 21;
