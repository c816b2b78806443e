//! System-wide open-file table.
//!
//! Every successful `open` installs one [`OpenFileEntry`] here. Descriptors
//! never point at an entry directly; they hold a [`FileRef`], which names a
//! slot *and* the generation of the entry installed in it. Once an entry is
//! destroyed its slot may be reused, and any handle still carrying the old
//! generation is rejected instead of silently aliasing the new entry.
//!
//! Locking: each slot has its own lock, held for every offset or reference
//! count mutation and across the VFS call of a read or write. Claiming a free
//! slot goes through a separate allocation lock. When both are needed the
//! slot lock is taken first.

use kfd_abi::fs::{AccessMode, OF_TABLE_SIZE};
use spin::Mutex;

use super::error::{FileError, FileResult};
use crate::vfs::VfsHandle;

/// Handle to a live open-file entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileRef {
    index: usize,
    generation: u32,
}

impl FileRef {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Shared state of one open.
#[derive(Debug)]
pub struct OpenFileEntry {
    pub(crate) object: VfsHandle,
    /// Never negative.
    pub(crate) offset: i64,
    /// Fixed for the life of the entry.
    pub(crate) access: AccessMode,
    pub(crate) append: bool,
    ref_count: u32,
}

impl OpenFileEntry {
    pub fn object(&self) -> &VfsHandle {
        &self.object
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn is_append(&self) -> bool {
        self.append
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }
}

struct EntrySlot {
    generation: u32,
    entry: Option<OpenFileEntry>,
}

impl EntrySlot {
    const fn empty() -> Self {
        Self {
            generation: 0,
            entry: None,
        }
    }

    fn live(&mut self, fref: FileRef) -> FileResult<&mut OpenFileEntry> {
        if self.generation != fref.generation {
            return Err(FileError::BadDescriptor);
        }
        self.entry.as_mut().ok_or(FileError::BadDescriptor)
    }
}

/// Outcome of dropping one reference.
#[derive(Debug)]
pub enum Release {
    /// Other descriptors still reference the entry.
    Retained(u32),
    /// That was the last reference. The caller must close the object.
    Destroyed(VfsHandle),
}

/// Returned by [`OpenFileTable::allocate_entry`] when every slot is taken.
/// Hands the object back so the caller can close it.
#[derive(Debug)]
pub struct TableFull(pub VfsHandle);

pub struct OpenFileTable {
    claimed: Mutex<[bool; OF_TABLE_SIZE]>,
    slots: [Mutex<EntrySlot>; OF_TABLE_SIZE],
    limit: usize,
}

impl OpenFileTable {
    pub const fn new() -> Self {
        Self::with_limit(OF_TABLE_SIZE)
    }

    /// A table that hands out at most `limit` entries, clamped to
    /// `1..=OF_TABLE_SIZE`.
    pub const fn with_limit(limit: usize) -> Self {
        let limit = if limit == 0 {
            1
        } else if limit > OF_TABLE_SIZE {
            OF_TABLE_SIZE
        } else {
            limit
        };
        Self {
            claimed: Mutex::new([false; OF_TABLE_SIZE]),
            slots: [const { Mutex::new(EntrySlot::empty()) }; OF_TABLE_SIZE],
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Install a new entry for `object` with one reference and offset 0.
    pub fn allocate_entry(
        &self,
        object: VfsHandle,
        access: AccessMode,
        append: bool,
    ) -> Result<FileRef, TableFull> {
        let index = {
            let mut claimed = self.claimed.lock();
            match claimed[..self.limit].iter().position(|&used| !used) {
                Some(index) => {
                    claimed[index] = true;
                    index
                }
                None => {
                    kfd_lib::klog_debug!("fileio: open-file table full ({} entries)", self.limit);
                    return Err(TableFull(object));
                }
            }
        };

        let mut slot = self.slots[index].lock();
        slot.generation = slot.generation.wrapping_add(1);
        let mut entry = OpenFileEntry {
            object,
            offset: 0,
            access,
            append,
            ref_count: 0,
        };
        entry.ref_count += 1;
        slot.entry = Some(entry);

        Ok(FileRef {
            index,
            generation: slot.generation,
        })
    }

    /// Add a reference. Returns the new count.
    pub fn retain(&self, fref: FileRef) -> FileResult<u32> {
        let mut slot = self.slot(fref)?.lock();
        let entry = slot.live(fref)?;
        entry.ref_count = entry.ref_count.checked_add(1).ok_or(FileError::SystemLimit)?;
        Ok(entry.ref_count)
    }

    /// Drop a reference.
    ///
    /// At zero the entry leaves its slot before the slot becomes allocatable
    /// again.
    pub fn release(&self, fref: FileRef) -> FileResult<Release> {
        let mut slot = self.slot(fref)?.lock();
        let entry = match slot.live(fref) {
            Ok(entry) => entry,
            Err(err) => {
                kfd_lib::klog_warn!(
                    "fileio: release of stale handle (slot {}, gen {})",
                    fref.index,
                    fref.generation
                );
                return Err(err);
            }
        };

        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            return Ok(Release::Retained(entry.ref_count));
        }

        let Some(entry) = slot.entry.take() else {
            return Err(FileError::BadDescriptor);
        };
        self.claimed.lock()[fref.index] = false;
        drop(slot);

        kfd_lib::klog_debug!("fileio: destroyed open file in slot {}", fref.index);
        Ok(Release::Destroyed(entry.object))
    }

    /// Run `f` on the entry with its lock held.
    pub fn with_entry<R>(
        &self,
        fref: FileRef,
        f: impl FnOnce(&mut OpenFileEntry) -> FileResult<R>,
    ) -> FileResult<R> {
        let mut slot = self.slot(fref)?.lock();
        f(slot.live(fref)?)
    }

    /// Current reference count, or `None` for a stale handle.
    pub fn ref_count(&self, fref: FileRef) -> Option<u32> {
        self.with_entry(fref, |entry| Ok(entry.ref_count)).ok()
    }

    /// Number of live entries.
    pub fn occupied(&self) -> usize {
        self.claimed.lock().iter().filter(|&&used| used).count()
    }

    fn slot(&self, fref: FileRef) -> FileResult<&Mutex<EntrySlot>> {
        self.slots[..self.limit]
            .get(fref.index)
            .ok_or(FileError::BadDescriptor)
    }
}

impl Default for OpenFileTable {
    fn default() -> Self {
        Self::new()
    }
}
