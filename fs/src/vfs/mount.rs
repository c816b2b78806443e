use core::sync::atomic::{AtomicUsize, Ordering};

use kfd_abi::fs::OpenFlags;
use spin::RwLock;

use crate::MAX_PATH_LEN;
use crate::vfs::ops::{Vfs, VfsHandle};
use crate::vfs::path::{resolve_parent, resolve_path};
use crate::vfs::traits::{FileSystem, FileType, VfsError, VfsResult};

const MAX_MOUNTS: usize = 16;

pub struct MountPoint {
    path: [u8; MAX_PATH_LEN],
    path_len: usize,
    fs: Option<&'static dyn FileSystem>,
}

impl MountPoint {
    const fn empty() -> Self {
        Self {
            path: [0; MAX_PATH_LEN],
            path_len: 0,
            fs: None,
        }
    }

    fn is_active(&self) -> bool {
        self.fs.is_some()
    }

    fn path_bytes(&self) -> &[u8] {
        &self.path[..self.path_len]
    }

    /// Whether `path` lies at or below this mount point.
    fn covers(&self, path: &[u8]) -> bool {
        let mp_path = self.path_bytes();
        if mp_path == b"/" {
            return true;
        }
        path.starts_with(mp_path)
            && (path.len() == mp_path.len() || path[mp_path.len()] == b'/')
    }
}

pub struct MountTable {
    mounts: [MountPoint; MAX_MOUNTS],
    count: usize,
}

impl MountTable {
    pub const fn new() -> Self {
        Self {
            mounts: [const { MountPoint::empty() }; MAX_MOUNTS],
            count: 0,
        }
    }

    pub fn mount(&mut self, path: &[u8], fs: &'static dyn FileSystem) -> VfsResult<()> {
        if path.is_empty() || path[0] != b'/' {
            return Err(VfsError::InvalidPath);
        }
        if path.len() > MAX_PATH_LEN {
            return Err(VfsError::NameTooLong);
        }

        if self
            .mounts
            .iter()
            .any(|mp| mp.is_active() && mp.path_bytes() == path)
        {
            return Err(VfsError::AlreadyExists);
        }

        let slot = self
            .mounts
            .iter_mut()
            .find(|m| !m.is_active())
            .ok_or(VfsError::NoSpace)?;

        slot.path[..path.len()].copy_from_slice(path);
        slot.path_len = path.len();
        slot.fs = Some(fs);
        self.count += 1;

        Ok(())
    }

    pub fn unmount(&mut self, path: &[u8]) -> VfsResult<()> {
        let mp = self
            .mounts
            .iter_mut()
            .find(|mp| mp.is_active() && mp.path_bytes() == path)
            .ok_or(VfsError::NotFound)?;
        mp.fs = None;
        mp.path_len = 0;
        self.count -= 1;
        Ok(())
    }

    /// Longest-prefix match of `path` against the active mount points.
    ///
    /// Returns the filesystem and the remainder of the path relative to its
    /// root (always starting with `/`).
    pub fn resolve<'a>(&self, path: &'a [u8]) -> VfsResult<(&'static dyn FileSystem, &'a [u8])> {
        if path.is_empty() || path[0] != b'/' {
            return Err(VfsError::InvalidPath);
        }

        let (mp, fs) = self
            .mounts
            .iter()
            .filter(|mp| mp.covers(path))
            .filter_map(|mp| mp.fs.map(|fs| (mp, fs)))
            .max_by_key(|(mp, _)| mp.path_len)
            .ok_or(VfsError::NotFound)?;

        let match_len = if mp.path_bytes() == b"/" { 0 } else { mp.path_len };
        let relative = if match_len >= path.len() {
            b"/" as &[u8]
        } else {
            &path[match_len..]
        };

        Ok((fs, relative))
    }

    pub fn mount_count(&self) -> usize {
        self.count
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Mount-table backed implementation of the [`Vfs`] boundary.
///
/// Tracks how many objects it has handed out and not yet had closed, which
/// lets callers check that every open is eventually balanced by exactly one
/// `close_object`.
pub struct MountVfs {
    mounts: RwLock<MountTable>,
    open_objects: AtomicUsize,
}

impl MountVfs {
    pub const fn new() -> Self {
        Self {
            mounts: RwLock::new(MountTable::new()),
            open_objects: AtomicUsize::new(0),
        }
    }

    pub fn mount(&self, path: &[u8], fs: &'static dyn FileSystem) -> VfsResult<()> {
        self.mounts.write().mount(path, fs)?;
        kfd_lib::klog_debug!(
            "vfs: mounted {} at {}",
            fs.name(),
            core::str::from_utf8(path).unwrap_or("?")
        );
        Ok(())
    }

    pub fn unmount(&self, path: &[u8]) -> VfsResult<()> {
        self.mounts.write().unmount(path)
    }

    pub fn with_mount_table<R>(&self, f: impl FnOnce(&MountTable) -> R) -> R {
        let guard = self.mounts.read();
        f(&guard)
    }

    /// Objects opened through this VFS and not yet closed.
    pub fn open_objects(&self) -> usize {
        self.open_objects.load(Ordering::Acquire)
    }

    fn open_existing(&self, path: &[u8], flags: OpenFlags) -> VfsResult<VfsHandle> {
        let resolved = self.with_mount_table(|mt| resolve_path(mt, path))?;
        if flags.contains(OpenFlags::CREAT | OpenFlags::EXCL) {
            return Err(VfsError::AlreadyExists);
        }

        let stat = resolved.fs.stat(resolved.inode)?;
        if stat.file_type == FileType::Directory {
            return Err(VfsError::IsDirectory);
        }

        let writable = flags.access_mode().is_some_and(|mode| mode.can_write());
        if flags.contains(OpenFlags::TRUNC) && writable && stat.file_type == FileType::Regular {
            resolved.fs.truncate(resolved.inode, 0)?;
        }

        Ok(VfsHandle::new(resolved.fs, resolved.inode))
    }

    fn create_new(&self, path: &[u8]) -> VfsResult<VfsHandle> {
        let (parent, name) = self.with_mount_table(|mt| resolve_parent(mt, path))?;
        let inode = parent.fs.create(parent.inode, name, FileType::Regular)?;
        Ok(VfsHandle::new(parent.fs, inode))
    }
}

impl Default for MountVfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs for MountVfs {
    fn open_object(&self, path: &[u8], flags: OpenFlags, _mode: u32) -> VfsResult<VfsHandle> {
        let handle = match self.open_existing(path, flags) {
            Err(VfsError::NotFound) if flags.contains(OpenFlags::CREAT) => {
                match self.create_new(path) {
                    // Lost a creation race; without EXCL the winner's file is fine.
                    Err(VfsError::AlreadyExists) if !flags.contains(OpenFlags::EXCL) => {
                        self.open_existing(path, flags)
                    }
                    other => other,
                }
            }
            other => other,
        }?;
        self.open_objects.fetch_add(1, Ordering::AcqRel);
        Ok(handle)
    }

    fn close_object(&self, object: VfsHandle) {
        self.open_objects.fetch_sub(1, Ordering::AcqRel);
        drop(object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DevFs, RamFs};
    use std::boxed::Box;

    fn leak<T>(value: T) -> &'static T {
        Box::leak(Box::new(value))
    }

    #[test]
    fn test_longest_prefix_wins() {
        let root: &'static RamFs = leak(RamFs::new());
        let dev: &'static DevFs = leak(DevFs::new());
        let mut mt = MountTable::new();
        mt.mount(b"/", root).unwrap();
        mt.mount(b"/dev", dev).unwrap();

        let (fs, rel) = mt.resolve(b"/dev/null").unwrap();
        assert_eq!(fs.name(), "devfs");
        assert_eq!(rel, b"/null");

        let (fs, rel) = mt.resolve(b"/device").unwrap();
        assert_eq!(fs.name(), "ramfs");
        assert_eq!(rel, b"/device");

        let (fs, rel) = mt.resolve(b"/dev").unwrap();
        assert_eq!(fs.name(), "devfs");
        assert_eq!(rel, b"/");
    }

    #[test]
    fn test_mount_rejects_duplicates_and_relative_paths() {
        let root: &'static RamFs = leak(RamFs::new());
        let mut mt = MountTable::new();
        mt.mount(b"/", root).unwrap();
        assert_eq!(mt.mount(b"/", root), Err(VfsError::AlreadyExists));
        assert_eq!(mt.mount(b"tmp", root), Err(VfsError::InvalidPath));
        assert_eq!(mt.mount_count(), 1);
        mt.unmount(b"/").unwrap();
        assert_eq!(mt.resolve(b"/x").err(), Some(VfsError::NotFound));
    }

    #[test]
    fn test_open_object_flag_handling() {
        let vfs = MountVfs::new();
        vfs.mount(b"/", leak(RamFs::new())).unwrap();

        assert_eq!(
            vfs.open_object(b"/a", OpenFlags::RDONLY, 0).err(),
            Some(VfsError::NotFound)
        );

        let h = vfs
            .open_object(b"/a", OpenFlags::WRONLY | OpenFlags::CREAT, 0o644)
            .unwrap();
        assert_eq!(vfs.write_object(&h, 0, b"hello").unwrap(), (5, 5));
        vfs.close_object(h);

        assert_eq!(
            vfs.open_object(b"/a", OpenFlags::RDWR | OpenFlags::CREAT | OpenFlags::EXCL, 0)
                .err(),
            Some(VfsError::AlreadyExists)
        );

        // Read-only opens never truncate.
        let h = vfs
            .open_object(b"/a", OpenFlags::RDONLY | OpenFlags::TRUNC, 0)
            .unwrap();
        assert_eq!(vfs.stat_object(&h).unwrap().size, 5);
        vfs.close_object(h);

        let h = vfs
            .open_object(b"/a", OpenFlags::WRONLY | OpenFlags::TRUNC, 0)
            .unwrap();
        assert_eq!(vfs.stat_object(&h).unwrap().size, 0);
        vfs.close_object(h);

        assert_eq!(
            vfs.open_object(b"/", OpenFlags::RDONLY, 0).err(),
            Some(VfsError::IsDirectory)
        );
        assert_eq!(vfs.open_objects(), 0);
    }
}
