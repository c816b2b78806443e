use kfd_abi::fs::OPEN_MAX;
use spin::{Mutex, MutexGuard};

use super::error::{FileError, FileResult};
use super::open_file::FileRef;

/// Per-process descriptor table. The slot index is the descriptor.
pub struct DescriptorTable {
    slots: Mutex<[Option<FileRef>; OPEN_MAX]>,
    limit: usize,
}

impl DescriptorTable {
    pub const fn new() -> Self {
        Self::with_limit(OPEN_MAX)
    }

    /// A table with `limit` usable descriptors, clamped to `1..=OPEN_MAX`.
    pub const fn with_limit(limit: usize) -> Self {
        let limit = if limit == 0 {
            1
        } else if limit > OPEN_MAX {
            OPEN_MAX
        } else {
            limit
        };
        Self {
            slots: Mutex::new([None; OPEN_MAX]),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Take the table lock. Sequences that must not interleave with sibling
    /// threads (allocate then bind, lookup then rebind) run on one guard.
    pub fn lock(&self) -> DescriptorGuard<'_> {
        DescriptorGuard {
            slots: self.slots.lock(),
            limit: self.limit,
        }
    }

    pub fn lookup(&self, fd: i32) -> FileResult<FileRef> {
        self.lock().lookup(fd)
    }

    pub fn bound_count(&self) -> usize {
        self.lock().bound().count()
    }

    /// Copy of the current bindings, indexed by descriptor.
    pub fn snapshot(&self) -> [Option<FileRef>; OPEN_MAX] {
        *self.slots.lock()
    }
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DescriptorGuard<'a> {
    slots: MutexGuard<'a, [Option<FileRef>; OPEN_MAX]>,
    limit: usize,
}

impl DescriptorGuard<'_> {
    /// Map `fd` to a slot index if it is within the table limit.
    pub fn index(&self, fd: i32) -> FileResult<usize> {
        usize::try_from(fd)
            .ok()
            .filter(|&idx| idx < self.limit)
            .ok_or(FileError::BadDescriptor)
    }

    /// Lowest-numbered free descriptor.
    pub fn allocate_slot(&self) -> FileResult<i32> {
        self.slots[..self.limit]
            .iter()
            .position(Option::is_none)
            .map(|idx| idx as i32)
            .ok_or(FileError::ProcessLimit)
    }

    pub fn lookup(&self, fd: i32) -> FileResult<FileRef> {
        let idx = self.index(fd)?;
        self.slots[idx].ok_or(FileError::BadDescriptor)
    }

    /// Binding of an in-range descriptor, if any.
    pub fn get(&self, fd: i32) -> FileResult<Option<FileRef>> {
        let idx = self.index(fd)?;
        Ok(self.slots[idx])
    }

    /// Point `fd` at `fref`, returning the previous binding.
    pub fn bind(&mut self, fd: i32, fref: FileRef) -> FileResult<Option<FileRef>> {
        let idx = self.index(fd)?;
        Ok(self.slots[idx].replace(fref))
    }

    pub fn unbind(&mut self, fd: i32) -> FileResult<FileRef> {
        let idx = self.index(fd)?;
        self.slots[idx].take().ok_or(FileError::BadDescriptor)
    }

    /// Bound descriptors in ascending order.
    pub fn bound(&self) -> impl Iterator<Item = (i32, FileRef)> + '_ {
        self.slots[..self.limit]
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.map(|fref| (idx as i32, fref)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileio::open_file::OpenFileTable;
    use crate::vfs::{FileSystem, VfsHandle};
    use crate::RamFs;
    use kfd_abi::fs::AccessMode;
    use std::boxed::Box;

    fn some_ref(table: &OpenFileTable) -> FileRef {
        let fs: &'static RamFs = Box::leak(Box::new(RamFs::new()));
        table
            .allocate_entry(VfsHandle::new(fs, fs.root_inode()), AccessMode::ReadOnly, false)
            .unwrap()
    }

    #[test]
    fn test_lowest_free_slot() {
        let oft = OpenFileTable::new();
        let fref = some_ref(&oft);
        let pdt = DescriptorTable::new();
        let mut g = pdt.lock();

        assert_eq!(g.allocate_slot(), Ok(0));
        g.bind(0, fref).unwrap();
        g.bind(1, fref).unwrap();
        g.bind(3, fref).unwrap();
        assert_eq!(g.allocate_slot(), Ok(2));

        g.unbind(0).unwrap();
        assert_eq!(g.allocate_slot(), Ok(0));
    }

    #[test]
    fn test_range_and_binding_checks() {
        let pdt = DescriptorTable::with_limit(4);
        let g = pdt.lock();
        assert_eq!(g.lookup(-1), Err(FileError::BadDescriptor));
        assert_eq!(g.lookup(4), Err(FileError::BadDescriptor));
        assert_eq!(g.lookup(OPEN_MAX as i32), Err(FileError::BadDescriptor));
        assert_eq!(g.lookup(2), Err(FileError::BadDescriptor));
        assert_eq!(g.get(2), Ok(None));
        assert_eq!(g.get(4), Err(FileError::BadDescriptor));
    }

    #[test]
    fn test_exhaustion() {
        let oft = OpenFileTable::new();
        let fref = some_ref(&oft);
        let pdt = DescriptorTable::with_limit(2);
        let mut g = pdt.lock();
        for _ in 0..2 {
            let fd = g.allocate_slot().unwrap();
            g.bind(fd, fref).unwrap();
        }
        assert_eq!(g.allocate_slot(), Err(FileError::ProcessLimit));
        drop(g);
        assert_eq!(pdt.bound_count(), 2);
    }

    #[test]
    fn test_bound_iterates_in_order() {
        let oft = OpenFileTable::new();
        let fref = some_ref(&oft);
        let pdt = DescriptorTable::new();
        let mut g = pdt.lock();
        g.bind(5, fref).unwrap();
        g.bind(2, fref).unwrap();
        let fds: std::vec::Vec<i32> = g.bound().map(|(fd, _)| fd).collect();
        assert_eq!(fds, [2, 5]);
        assert_eq!(g.unbind(7), Err(FileError::BadDescriptor));
    }
}
