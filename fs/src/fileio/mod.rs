//! File-descriptor layer.
//!
//! Three pieces cooperate here:
//!
//! * [`OpenFileTable`]: system-wide, one entry per successful open, holding
//!   the offset, access mode and reference count.
//! * [`DescriptorTable`]: one per process, mapping small integers to
//!   [`FileRef`] handles into the open-file table.
//! * [`FileIo`]: the operations (`open`, `close`, `dup2`, `read`, ...) that
//!   compose the two with the [`Vfs`] object layer.
//!
//! A descriptor table lock is never held while another lock is taken, so an
//! entry busy in the VFS stalls only callers using that same open. Entry
//! locks nest outside the open-file table's allocation lock. The VFS is only
//! ever called with at most an entry lock held; objects whose last reference
//! goes away are closed after every table lock has been dropped.

mod config;
mod descriptor;
mod error;
mod open_file;

pub use config::{FileioConfig, fileio_config_from_cmdline};
pub use descriptor::{DescriptorGuard, DescriptorTable};
pub use error::{FileError, FileResult};
pub use open_file::{FileRef, OpenFileEntry, OpenFileTable, Release, TableFull};

use kfd_abi::fs::{OpenFlags, Whence};

use crate::vfs::{FileStat, Vfs};

fn to_offset(pos: u64) -> FileResult<i64> {
    i64::try_from(pos).map_err(|_| FileError::InvalidArgument)
}

impl OpenFileEntry {
    /// The offset as a VFS position.
    fn position(&self) -> u64 {
        // Entry offsets are never negative.
        self.offset as u64
    }
}

/// Descriptor operations bound to one open-file table and VFS.
#[derive(Clone, Copy)]
pub struct FileIo<'a> {
    table: &'a OpenFileTable,
    vfs: &'a dyn Vfs,
}

impl<'a> FileIo<'a> {
    pub fn new(table: &'a OpenFileTable, vfs: &'a dyn Vfs) -> Self {
        Self { table, vfs }
    }

    pub fn table(&self) -> &'a OpenFileTable {
        self.table
    }

    fn dispose(&self, release: Release) {
        if let Release::Destroyed(object) = release {
            self.vfs.close_object(object);
        }
    }

    /// Open `path` and bind it to the lowest free descriptor of `pdt`.
    pub fn open(
        &self,
        pdt: &DescriptorTable,
        path: &[u8],
        flags: OpenFlags,
        mode: u32,
    ) -> FileResult<i32> {
        let access = flags.access_mode().ok_or(FileError::InvalidArgument)?;
        let object = self.vfs.open_object(path, flags, mode)?;

        let fref = match self
            .table
            .allocate_entry(object, access, flags.contains(OpenFlags::APPEND))
        {
            Ok(fref) => fref,
            Err(TableFull(object)) => {
                self.vfs.close_object(object);
                return Err(FileError::SystemLimit);
            }
        };

        let bound = {
            let mut guard = pdt.lock();
            guard
                .allocate_slot()
                .and_then(|fd| guard.bind(fd, fref).map(|_| fd))
        };

        bound.inspect_err(|err| {
            kfd_lib::klog_debug!("fileio: open unwinding: {}", err);
            // Nothing else can see the entry yet, so this drops the last reference.
            match self.table.release(fref) {
                Ok(release @ Release::Destroyed(_)) => self.dispose(release),
                Ok(Release::Retained(refs)) => {
                    kfd_lib::klog_warn!("fileio: unbound open still has {} references", refs);
                }
                Err(err) => kfd_lib::klog_warn!("fileio: open unwinding failed: {}", err),
            }
        })
    }

    /// Unbind `fd` and drop its reference. The object is closed when this was
    /// the last descriptor anywhere referring to the open.
    ///
    /// The descriptor table lock covers only the unbind; the entry lock taken
    /// by the release may wait behind I/O in progress on the same open.
    pub fn close(&self, pdt: &DescriptorTable, fd: i32) -> FileResult<()> {
        let fref = pdt.lock().unbind(fd)?;
        let release = self.table.release(fref)?;
        self.dispose(release);
        Ok(())
    }

    /// Drop a reference taken on a path that is being abandoned.
    ///
    /// `last_expected` says whether a concurrent close may have left this
    /// reference as the only one.
    fn drop_extra_ref(&self, fref: FileRef, last_expected: bool, what: &str) {
        match self.table.release(fref) {
            Ok(Release::Retained(_)) => {}
            Ok(release @ Release::Destroyed(_)) => {
                if !last_expected {
                    kfd_lib::klog_warn!(
                        "fileio: {} rollback dropped the last reference (slot {})",
                        what,
                        fref.index()
                    );
                }
                self.dispose(release);
            }
            Err(err) => {
                kfd_lib::klog_warn!("fileio: {} rollback failed: {}", what, err);
            }
        }
    }

    /// Take a reference on the open behind `oldfd` without holding the
    /// descriptor table lock across the entry lock.
    ///
    /// Returns the handle once `oldfd` is confirmed to still name it, with
    /// the table lock held again so the caller can bind atomically.
    fn retain_bound<'p>(
        &self,
        pdt: &'p DescriptorTable,
        oldfd: i32,
    ) -> FileResult<(FileRef, DescriptorGuard<'p>)> {
        let old = pdt.lookup(oldfd)?;
        self.table.retain(old)?;
        let guard = pdt.lock();
        if guard.get(oldfd) == Ok(Some(old)) {
            return Ok((old, guard));
        }
        // `oldfd` was closed or rebound meanwhile.
        drop(guard);
        self.drop_extra_ref(old, true, "dup");
        Err(FileError::BadDescriptor)
    }

    /// Make `newfd` refer to the same open as `oldfd`, closing whatever
    /// `newfd` referred to before.
    pub fn dup2(&self, pdt: &DescriptorTable, oldfd: i32, newfd: i32) -> FileResult<i32> {
        {
            let guard = pdt.lock();
            guard.index(oldfd)?;
            guard.index(newfd)?;
        }
        if oldfd == newfd {
            return Ok(newfd);
        }

        let (old, mut guard) = self.retain_bound(pdt, oldfd)?;
        let displaced = match guard.bind(newfd, old) {
            Ok(displaced) => displaced,
            Err(err) => {
                drop(guard);
                self.drop_extra_ref(old, true, "dup2");
                return Err(err);
            }
        };
        drop(guard);

        // Unbound now, so this is the same as a close of the old `newfd`.
        if let Some(current) = displaced {
            let release = self.table.release(current)?;
            self.dispose(release);
        }
        Ok(newfd)
    }

    /// Duplicate `oldfd` onto the lowest free descriptor.
    pub fn dup(&self, pdt: &DescriptorTable, oldfd: i32) -> FileResult<i32> {
        let (old, mut guard) = self.retain_bound(pdt, oldfd)?;
        let bound = guard
            .allocate_slot()
            .and_then(|fd| guard.bind(fd, old).map(|_| fd));
        drop(guard);
        bound.inspect_err(|_| self.drop_extra_ref(old, true, "dup"))
    }

    pub fn read(&self, pdt: &DescriptorTable, fd: i32, buf: &mut [u8]) -> FileResult<usize> {
        let fref = pdt.lookup(fd)?;
        self.table.with_entry(fref, |entry| {
            if !entry.access().can_read() {
                return Err(FileError::BadDescriptor);
            }
            let (n, new_offset) = self.vfs.read_object(&entry.object, entry.position(), buf)?;
            entry.offset = to_offset(new_offset)?;
            Ok(n)
        })
    }

    pub fn write(&self, pdt: &DescriptorTable, fd: i32, buf: &[u8]) -> FileResult<usize> {
        let fref = pdt.lookup(fd)?;
        self.table.with_entry(fref, |entry| {
            if !entry.access().can_write() {
                return Err(FileError::BadDescriptor);
            }
            if entry.is_append() {
                entry.offset = to_offset(self.vfs.stat_object(&entry.object)?.size)?;
            }
            let (n, new_offset) = self.vfs.write_object(&entry.object, entry.position(), buf)?;
            entry.offset = to_offset(new_offset)?;
            Ok(n)
        })
    }

    /// Reposition the shared offset. `whence` is the raw `SEEK_*` value.
    ///
    /// On any error the offset is left untouched.
    pub fn lseek(&self, pdt: &DescriptorTable, fd: i32, pos: i64, whence: u32) -> FileResult<i64> {
        let fref = pdt.lookup(fd)?;
        self.table.with_entry(fref, |entry| {
            if !self.vfs.is_seekable(&entry.object)? {
                return Err(FileError::NotSeekable);
            }

            let base = match Whence::from_raw(whence).ok_or(FileError::InvalidArgument)? {
                Whence::Set => 0,
                Whence::Current => entry.offset(),
                Whence::End => to_offset(self.vfs.stat_object(&entry.object)?.size)?,
            };

            let new_offset = base
                .checked_add(pos)
                .filter(|&off| off >= 0)
                .ok_or(FileError::InvalidArgument)?;
            entry.offset = new_offset;
            Ok(new_offset)
        })
    }

    pub fn fstat(&self, pdt: &DescriptorTable, fd: i32) -> FileResult<FileStat> {
        let fref = pdt.lookup(fd)?;
        self.table
            .with_entry(fref, |entry| Ok(self.vfs.stat_object(&entry.object)?))
    }

    /// Build a child table sharing every open of `parent`.
    ///
    /// Each copied binding adds one reference. Bindings closed while the copy
    /// is in progress are left out. If any other retain fails the references
    /// already taken are dropped again and no table is produced.
    pub fn fork_table(&self, parent: &DescriptorTable) -> FileResult<DescriptorTable> {
        let limit = parent.limit();
        let mut copied = parent.snapshot();
        for idx in 0..limit {
            let Some(fref) = copied[idx] else {
                continue;
            };
            match self.table.retain(fref) {
                Ok(_) => {}
                Err(FileError::BadDescriptor) => copied[idx] = None,
                Err(err) => {
                    for fref in copied[..idx].iter().flatten() {
                        self.drop_extra_ref(*fref, true, "fork");
                    }
                    return Err(err);
                }
            }
        }

        let child = DescriptorTable::with_limit(limit);
        {
            let mut dst = child.lock();
            for (fd, slot) in copied[..limit].iter().enumerate() {
                if let Some(fref) = *slot {
                    dst.bind(fd as i32, fref)?;
                }
            }
        }
        Ok(child)
    }

    /// Close every bound descriptor of `pdt`, as on process exit.
    /// Returns how many were closed.
    pub fn close_all(&self, pdt: &DescriptorTable) -> usize {
        let mut closed = 0;
        for (fd, slot) in pdt.snapshot().iter().enumerate() {
            if slot.is_some() && self.close(pdt, fd as i32).is_ok() {
                closed += 1;
            }
        }
        if closed > 0 {
            kfd_lib::klog_debug!("fileio: closed {} descriptors on exit", closed);
        }
        closed
    }
}
