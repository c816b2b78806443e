//! Error numbers returned (negated) from file syscalls.
//!
//! Values follow the Linux x86_64 numbering so that userland C code built
//! against a conventional `errno.h` interprets them correctly.

pub const EPERM: i32 = 1;
pub const ENOENT: i32 = 2;
pub const EIO: i32 = 5;
pub const EBADF: i32 = 9;
pub const ENOMEM: i32 = 12;
pub const EACCES: i32 = 13;
pub const EFAULT: i32 = 14;
pub const EEXIST: i32 = 17;
pub const ENOTDIR: i32 = 20;
pub const EISDIR: i32 = 21;
pub const EINVAL: i32 = 22;
/// System-wide open-file table is full.
pub const ENFILE: i32 = 23;
/// Per-process descriptor table is full.
pub const EMFILE: i32 = 24;
pub const ENOSPC: i32 = 28;
/// Illegal seek on a non-seekable object.
pub const ESPIPE: i32 = 29;
pub const EROFS: i32 = 30;
pub const ENAMETOOLONG: i32 = 36;
pub const ENOSYS: i32 = 38;
pub const ENOTSUP: i32 = 95;

/// Short symbolic name for an errno value, for log lines.
pub fn errno_name(errno: i32) -> &'static str {
    match errno {
        EPERM => "EPERM",
        ENOENT => "ENOENT",
        EIO => "EIO",
        EBADF => "EBADF",
        ENOMEM => "ENOMEM",
        EACCES => "EACCES",
        EFAULT => "EFAULT",
        EEXIST => "EEXIST",
        ENOTDIR => "ENOTDIR",
        EISDIR => "EISDIR",
        EINVAL => "EINVAL",
        ENFILE => "ENFILE",
        EMFILE => "EMFILE",
        ENOSPC => "ENOSPC",
        ESPIPE => "ESPIPE",
        EROFS => "EROFS",
        ENAMETOOLONG => "ENAMETOOLONG",
        ENOSYS => "ENOSYS",
        ENOTSUP => "ENOTSUP",
        _ => "E?",
    }
}
