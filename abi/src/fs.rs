//! Filesystem ABI types shared between kernel and userland.

use bitflags::bitflags;

/// Maximum path length accepted by `open`, including the terminating NUL.
pub const PATH_MAX: usize = 256;

/// Maximum length of a single path component.
pub const NAME_MAX: usize = 32;

/// Hard ceiling on descriptors per process. Runtime limits may be lower.
pub const OPEN_MAX: usize = 32;

/// Hard ceiling on simultaneously open files across the whole system.
pub const OF_TABLE_SIZE: usize = 64;

/// Filesystem entry type constants reported through `UserFileStat`.
pub const FS_TYPE_FILE: u8 = 0;
pub const FS_TYPE_DIRECTORY: u8 = 1;
pub const FS_TYPE_CHARDEV: u8 = 2;
pub const FS_TYPE_UNKNOWN: u8 = 0xFF;

pub const O_RDONLY: u32 = 0x0;
pub const O_WRONLY: u32 = 0x1;
pub const O_RDWR: u32 = 0x2;
pub const O_ACCMODE: u32 = 0x3;
pub const O_CREAT: u32 = 0x40;
pub const O_EXCL: u32 = 0x80;
pub const O_TRUNC: u32 = 0x200;
pub const O_APPEND: u32 = 0x400;

pub const SEEK_SET: u32 = 0;
pub const SEEK_CUR: u32 = 1;
pub const SEEK_END: u32 = 2;

bitflags! {
    /// Flags passed to `open`.
    ///
    /// The low two bits carry the access mode and are not independent flags:
    /// use [`OpenFlags::access_mode`] instead of testing them directly.
    /// Unknown bits are retained so the kernel can pass them through to the
    /// VFS untouched.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const WRONLY = O_WRONLY;
        const RDWR   = O_RDWR;
        /// Create the file if it does not exist.
        const CREAT  = O_CREAT;
        /// With `CREAT`, fail if the file already exists.
        const EXCL   = O_EXCL;
        /// Truncate a writable regular file to zero length.
        const TRUNC  = O_TRUNC;
        /// Every write first moves the offset to end of file.
        const APPEND = O_APPEND;
    }
}

impl OpenFlags {
    pub const RDONLY: Self = Self::empty();

    /// Decode the access mode bits. `None` for the reserved value `O_ACCMODE`.
    pub fn access_mode(self) -> Option<AccessMode> {
        AccessMode::from_bits(self.bits() & O_ACCMODE)
    }
}

/// How an open file may be used. Fixed for the lifetime of the open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum AccessMode {
    ReadOnly = O_RDONLY,
    WriteOnly = O_WRONLY,
    ReadWrite = O_RDWR,
}

impl AccessMode {
    pub const fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            O_RDONLY => Some(Self::ReadOnly),
            O_WRONLY => Some(Self::WriteOnly),
            O_RDWR => Some(Self::ReadWrite),
            _ => None,
        }
    }

    #[inline]
    pub const fn can_read(self) -> bool {
        !matches!(self, Self::WriteOnly)
    }

    #[inline]
    pub const fn can_write(self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

/// Reference point for `lseek`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Whence {
    Set = SEEK_SET,
    Current = SEEK_CUR,
    End = SEEK_END,
}

impl Whence {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            SEEK_SET => Some(Self::Set),
            SEEK_CUR => Some(Self::Current),
            SEEK_END => Some(Self::End),
            _ => None,
        }
    }
}

/// Descriptor stat information.
///
/// Returned by the fstat syscall.
#[repr(C)]
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct UserFileStat {
    /// Entry type (`FS_TYPE_*`)
    pub type_: u8,
    /// Permission bits
    pub mode: u16,
    /// Size in bytes
    pub size: u64,
}

impl UserFileStat {
    /// Size of the `repr(C)` layout copied out to userland.
    pub const SIZE: usize = 16;

    /// Little-endian image of the `repr(C)` layout, padding zeroed.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = self.type_;
        out[2..4].copy_from_slice(&self.mode.to_le_bytes());
        out[8..16].copy_from_slice(&self.size.to_le_bytes());
        out
    }
}
