use core::fmt;

use kfd_abi::errno;

use crate::vfs::VfsError;

pub type FileResult<T> = Result<T, FileError>;

/// Failures of the descriptor-layer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileError {
    /// Descriptor out of range, unbound, stale, or opened without the
    /// access the operation needs.
    BadDescriptor,
    /// Bad whence, a seek to a negative offset, or invalid access-mode bits.
    InvalidArgument,
    /// The object behind the descriptor has no position.
    NotSeekable,
    /// The calling process has no free descriptor.
    ProcessLimit,
    /// The system-wide open-file table is full.
    SystemLimit,
    Vfs(VfsError),
}

impl FileError {
    pub const fn errno(self) -> i32 {
        match self {
            Self::BadDescriptor => errno::EBADF,
            Self::InvalidArgument => errno::EINVAL,
            Self::NotSeekable => errno::ESPIPE,
            Self::ProcessLimit => errno::EMFILE,
            Self::SystemLimit => errno::ENFILE,
            Self::Vfs(err) => err.errno(),
        }
    }
}

impl From<VfsError> for FileError {
    fn from(err: VfsError) -> Self {
        Self::Vfs(err)
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadDescriptor => f.write_str("bad file descriptor"),
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::NotSeekable => f.write_str("illegal seek"),
            Self::ProcessLimit => f.write_str("too many open files"),
            Self::SystemLimit => f.write_str("too many open files in system"),
            Self::Vfs(err) => write!(f, "vfs: {}", err),
        }
    }
}
