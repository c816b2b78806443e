use core::fmt;

use kfd_abi::errno;
use kfd_fs::{FileError, VfsError};

use crate::user::{UserMemory, UserPtrError};

pub const USER_IO_MAX_BYTES: usize = 512;
pub use kfd_abi::fs::PATH_MAX as USER_PATH_MAX;

/// Why a syscall failed. Reaches userland as a negated errno.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallError {
    File(FileError),
    /// A user pointer could not be copied from or to.
    Fault,
    /// A user path has no terminator within `USER_PATH_MAX` bytes.
    NameTooLong,
}

impl SyscallError {
    pub const fn errno(self) -> i32 {
        match self {
            Self::File(err) => err.errno(),
            Self::Fault => errno::EFAULT,
            Self::NameTooLong => errno::ENAMETOOLONG,
        }
    }
}

impl From<FileError> for SyscallError {
    fn from(err: FileError) -> Self {
        Self::File(err)
    }
}

impl From<VfsError> for SyscallError {
    fn from(err: VfsError) -> Self {
        Self::File(FileError::Vfs(err))
    }
}

impl From<UserPtrError> for SyscallError {
    fn from(_: UserPtrError) -> Self {
        Self::Fault
    }
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(err) => err.fmt(f),
            Self::Fault => f.write_str("bad address"),
            Self::NameTooLong => f.write_str("path too long"),
        }
    }
}

pub type SyscallResult = Result<u64, SyscallError>;

/// Register value for `result`: the value itself, or `-errno`.
pub fn syscall_return(result: SyscallResult) -> i64 {
    match result {
        Ok(value) => value as i64,
        Err(err) => -(err.errno() as i64),
    }
}

/// Copy a NUL-terminated path from userland into `dst`, returning the path
/// bytes without the terminator.
pub fn syscall_copy_user_path<'b>(
    user: &dyn UserMemory,
    dst: &'b mut [u8; USER_PATH_MAX],
    user_src: u64,
) -> Result<&'b [u8], SyscallError> {
    match user.copy_str_from_user(user_src, dst)? {
        Some(len) => Ok(&dst[..len]),
        None => Err(SyscallError::NameTooLong),
    }
}

/// Copy at most `dst.len()` of the `requested_len` bytes at `user_src`.
/// Returns how many were copied.
pub fn syscall_bounded_from_user(
    user: &dyn UserMemory,
    dst: &mut [u8],
    user_src: u64,
    requested_len: u64,
) -> Result<usize, SyscallError> {
    let len = usize::try_from(requested_len)
        .unwrap_or(usize::MAX)
        .min(dst.len());
    user.copy_from_user(user_src, &mut dst[..len])?;
    Ok(len)
}
