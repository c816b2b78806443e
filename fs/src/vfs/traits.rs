//! VFS trait definitions for the file-descriptor layer.
//!
//! This module defines the abstractions every filesystem implementation
//! plugs into. Operations are inode-based; path resolution lives one level
//! up in [`crate::vfs::path`].

use core::fmt;

use kfd_abi::errno;
use kfd_abi::fs::{FS_TYPE_CHARDEV, FS_TYPE_DIRECTORY, FS_TYPE_FILE, FS_TYPE_UNKNOWN, UserFileStat};

/// Unique identifier for an inode within a filesystem.
/// Each filesystem maintains its own inode number space.
pub type InodeId = u64;

/// File type enumeration matching Unix file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FileType {
    /// Regular file
    Regular = 1,
    /// Directory
    Directory = 2,
    /// Character device (e.g., /dev/null)
    CharDevice = 3,
    /// Block device
    BlockDevice = 4,
    /// Named pipe (FIFO)
    Pipe = 6,
    /// Unix domain socket
    Socket = 7,
}

impl FileType {
    /// Whether an open of this type carries a meaningful position.
    ///
    /// Streams (character devices, pipes, sockets) reject `lseek`.
    pub const fn is_seekable(self) -> bool {
        matches!(self, Self::Regular | Self::Directory | Self::BlockDevice)
    }

    pub const fn abi_type(self) -> u8 {
        match self {
            Self::Regular => FS_TYPE_FILE,
            Self::Directory => FS_TYPE_DIRECTORY,
            Self::CharDevice => FS_TYPE_CHARDEV,
            _ => FS_TYPE_UNKNOWN,
        }
    }
}

/// Metadata about a file or directory.
/// Returned by stat operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Inode number within the filesystem
    pub inode: InodeId,
    /// Type of file (regular, directory, device, etc.)
    pub file_type: FileType,
    /// Size in bytes (0 for directories, devices)
    pub size: u64,
    /// Unix permission bits (rwxrwxrwx)
    pub mode: u16,
    /// Major device number (for device files)
    pub dev_major: u32,
    /// Minor device number (for device files)
    pub dev_minor: u32,
}

impl FileStat {
    /// Create a new FileStat with default values for a regular file.
    pub const fn new_file(inode: InodeId, size: u64) -> Self {
        Self {
            inode,
            file_type: FileType::Regular,
            size,
            mode: 0o644,
            dev_major: 0,
            dev_minor: 0,
        }
    }

    /// Create a new FileStat with default values for a directory.
    pub const fn new_directory(inode: InodeId) -> Self {
        Self {
            inode,
            file_type: FileType::Directory,
            size: 0,
            mode: 0o755,
            dev_major: 0,
            dev_minor: 0,
        }
    }

    /// Create a new FileStat for a character device.
    pub const fn new_char_device(inode: InodeId, major: u32, minor: u32) -> Self {
        Self {
            inode,
            file_type: FileType::CharDevice,
            size: 0,
            mode: 0o666,
            dev_major: major,
            dev_minor: minor,
        }
    }
}

impl From<&FileStat> for UserFileStat {
    fn from(stat: &FileStat) -> Self {
        Self {
            type_: stat.file_type.abi_type(),
            mode: stat.mode,
            size: stat.size,
        }
    }
}

/// Result type for VFS operations.
pub type VfsResult<T> = Result<T, VfsError>;

/// Errors that can occur during VFS operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VfsError {
    /// File or directory not found (ENOENT)
    NotFound,
    /// Path component is not a directory (ENOTDIR)
    NotDirectory,
    /// Operation not permitted on a directory (EISDIR)
    IsDirectory,
    /// Permission denied (EACCES)
    PermissionDenied,
    /// Filesystem is read-only (EROFS)
    ReadOnly,
    /// No space left on device (ENOSPC)
    NoSpace,
    /// I/O error (EIO)
    IoError,
    /// Invalid path format
    InvalidPath,
    /// File or directory already exists (EEXIST)
    AlreadyExists,
    /// Operation not supported (ENOTSUP)
    NotSupported,
    /// Filename too long (ENAMETOOLONG)
    NameTooLong,
    /// Invalid argument (EINVAL)
    InvalidArgument,
}

impl VfsError {
    pub const fn errno(self) -> i32 {
        match self {
            Self::NotFound => errno::ENOENT,
            Self::NotDirectory => errno::ENOTDIR,
            Self::IsDirectory => errno::EISDIR,
            Self::PermissionDenied => errno::EACCES,
            Self::ReadOnly => errno::EROFS,
            Self::NoSpace => errno::ENOSPC,
            Self::IoError => errno::EIO,
            Self::InvalidPath | Self::InvalidArgument => errno::EINVAL,
            Self::AlreadyExists => errno::EEXIST,
            Self::NotSupported => errno::ENOTSUP,
            Self::NameTooLong => errno::ENAMETOOLONG,
        }
    }
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NotFound => "no such file or directory",
            Self::NotDirectory => "not a directory",
            Self::IsDirectory => "is a directory",
            Self::PermissionDenied => "permission denied",
            Self::ReadOnly => "read-only filesystem",
            Self::NoSpace => "no space left on device",
            Self::IoError => "i/o error",
            Self::InvalidPath => "invalid path",
            Self::AlreadyExists => "file exists",
            Self::NotSupported => "operation not supported",
            Self::NameTooLong => "file name too long",
            Self::InvalidArgument => "invalid argument",
        };
        f.write_str(msg)
    }
}

/// A filesystem implementation.
///
/// All filesystem types (ramfs, devfs) implement this trait.
/// Operations are inode-based internally, with path resolution handled
/// by the VFS layer above.
pub trait FileSystem: Send + Sync {
    /// Get the name of this filesystem type (e.g., "ramfs", "devfs").
    fn name(&self) -> &'static str;

    /// Get the root inode of this filesystem.
    /// This is the entry point for all path traversal within this mount.
    fn root_inode(&self) -> InodeId;

    /// Look up a child entry in a directory by name.
    ///
    /// # Returns
    /// The inode of the found entry, or `VfsError::NotFound`.
    fn lookup(&self, parent: InodeId, name: &[u8]) -> VfsResult<InodeId>;

    /// Get metadata (stat) for an inode.
    fn stat(&self, inode: InodeId) -> VfsResult<FileStat>;

    /// Read data from a file.
    ///
    /// # Returns
    /// Number of bytes actually read (may be less than buffer size at EOF).
    fn read(&self, inode: InodeId, offset: u64, buf: &mut [u8]) -> VfsResult<usize>;

    /// Write data to a file.
    ///
    /// # Returns
    /// Number of bytes actually written.
    fn write(&self, inode: InodeId, offset: u64, buf: &[u8]) -> VfsResult<usize>;

    /// Create a new file or directory in a parent directory.
    fn create(&self, parent: InodeId, name: &[u8], file_type: FileType) -> VfsResult<InodeId>;

    /// Truncate a file to a specified length.
    fn truncate(&self, inode: InodeId, size: u64) -> VfsResult<()> {
        let _ = (inode, size);
        Err(VfsError::NotSupported)
    }
}
