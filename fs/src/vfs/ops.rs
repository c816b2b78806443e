use core::fmt;

use kfd_abi::fs::OpenFlags;

use crate::vfs::traits::{FileStat, FileSystem, InodeId, VfsResult};

/// An open VFS object.
///
/// Owned by exactly one open-file entry. Neither `Clone` nor
/// `Copy`: the only way to dispose of one is to hand it back through
/// [`Vfs::close_object`].
pub struct VfsHandle {
    pub inode: InodeId,
    pub fs: &'static dyn FileSystem,
}

impl VfsHandle {
    pub fn new(fs: &'static dyn FileSystem, inode: InodeId) -> Self {
        Self { inode, fs }
    }
}

impl fmt::Debug for VfsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VfsHandle")
            .field("fs", &self.fs.name())
            .field("inode", &self.inode)
            .finish()
    }
}

/// The object layer consumed by the descriptor tables.
///
/// Only `open_object` is required. The remaining operations default to
/// forwarding to the handle's filesystem, with the position advanced by the
/// number of bytes transferred.
pub trait Vfs: Send + Sync {
    /// Resolve `path` and produce an object honouring `flags`.
    fn open_object(&self, path: &[u8], flags: OpenFlags, mode: u32) -> VfsResult<VfsHandle>;

    /// Release an object. Called exactly once per successful `open_object`.
    fn close_object(&self, object: VfsHandle) {
        drop(object);
    }

    /// Returns `(bytes_read, new_offset)`.
    fn read_object(
        &self,
        object: &VfsHandle,
        offset: u64,
        buf: &mut [u8],
    ) -> VfsResult<(usize, u64)> {
        let n = object.fs.read(object.inode, offset, buf)?;
        Ok((n, offset.saturating_add(n as u64)))
    }

    /// Returns `(bytes_written, new_offset)`.
    fn write_object(&self, object: &VfsHandle, offset: u64, buf: &[u8]) -> VfsResult<(usize, u64)> {
        let n = object.fs.write(object.inode, offset, buf)?;
        Ok((n, offset.saturating_add(n as u64)))
    }

    fn stat_object(&self, object: &VfsHandle) -> VfsResult<FileStat> {
        object.fs.stat(object.inode)
    }

    fn is_seekable(&self, object: &VfsHandle) -> VfsResult<bool> {
        Ok(self.stat_object(object)?.file_type.is_seekable())
    }
}
