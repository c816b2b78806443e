use spin::Mutex;

use crate::MAX_NAME_LEN;
use crate::vfs::{FileStat, FileSystem, FileType, InodeId, VfsError, VfsResult};

const MAX_INODES: usize = 32;
const RAMFS_MAX_FILE_SIZE: usize = 4096;
const MAX_DIR_ENTRIES: usize = 16;

const ROOT_INODE: InodeId = 1;

#[derive(Clone, Copy)]
struct DirEntry {
    name: [u8; MAX_NAME_LEN],
    name_len: usize,
    inode: InodeId,
}

impl DirEntry {
    const fn empty() -> Self {
        Self {
            name: [0; MAX_NAME_LEN],
            name_len: 0,
            inode: 0,
        }
    }

    fn name(&self) -> &[u8] {
        &self.name[..self.name_len]
    }
}

struct RamInode {
    in_use: bool,
    file_type: FileType,
    data: [u8; RAMFS_MAX_FILE_SIZE],
    data_len: usize,
    dir_entries: [DirEntry; MAX_DIR_ENTRIES],
    dir_entry_count: usize,
    mode: u16,
}

impl RamInode {
    const fn empty() -> Self {
        Self {
            in_use: false,
            file_type: FileType::Regular,
            data: [0; RAMFS_MAX_FILE_SIZE],
            data_len: 0,
            dir_entries: [const { DirEntry::empty() }; MAX_DIR_ENTRIES],
            dir_entry_count: 0,
            mode: 0o644,
        }
    }

    fn entries(&self) -> &[DirEntry] {
        &self.dir_entries[..self.dir_entry_count]
    }

    fn add_dir_entry(&mut self, name: &[u8], inode: InodeId) -> VfsResult<()> {
        if name.len() > MAX_NAME_LEN {
            return Err(VfsError::NameTooLong);
        }
        if self.entries().iter().any(|e| e.name() == name) {
            return Err(VfsError::AlreadyExists);
        }
        let entry = self
            .dir_entries
            .get_mut(self.dir_entry_count)
            .ok_or(VfsError::NoSpace)?;

        entry.name[..name.len()].copy_from_slice(name);
        entry.name_len = name.len();
        entry.inode = inode;
        self.dir_entry_count += 1;

        Ok(())
    }

    fn lookup(&self, name: &[u8]) -> VfsResult<InodeId> {
        self.entries()
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.inode)
            .ok_or(VfsError::NotFound)
    }
}

struct RamFsInner {
    inodes: [RamInode; MAX_INODES],
    initialized: bool,
}

impl RamFsInner {
    const fn new_const() -> Self {
        Self {
            inodes: [const { RamInode::empty() }; MAX_INODES],
            initialized: false,
        }
    }

    fn ensure_initialized(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let root = &mut self.inodes[ROOT_INODE as usize];
        root.in_use = true;
        root.file_type = FileType::Directory;
        root.mode = 0o755;

        // Fresh root has room for both entries.
        let _ = root.add_dir_entry(b".", ROOT_INODE);
        let _ = root.add_dir_entry(b"..", ROOT_INODE);
    }

    fn alloc_inode(&mut self) -> VfsResult<InodeId> {
        self.inodes
            .iter()
            .enumerate()
            .skip(ROOT_INODE as usize + 1)
            .find(|(_, inode)| !inode.in_use)
            .map(|(id, _)| id as InodeId)
            .ok_or(VfsError::NoSpace)
    }

    fn get_inode(&self, id: InodeId) -> VfsResult<&RamInode> {
        self.inodes
            .get(id as usize)
            .filter(|inode| inode.in_use)
            .ok_or(VfsError::NotFound)
    }

    fn get_inode_mut(&mut self, id: InodeId) -> VfsResult<&mut RamInode> {
        self.inodes
            .get_mut(id as usize)
            .filter(|inode| inode.in_use)
            .ok_or(VfsError::NotFound)
    }

    fn regular_file_mut(&mut self, id: InodeId) -> VfsResult<&mut RamInode> {
        let inode = self.get_inode_mut(id)?;
        if inode.file_type == FileType::Directory {
            return Err(VfsError::IsDirectory);
        }
        Ok(inode)
    }
}

/// Fixed-capacity in-memory filesystem.
///
/// Holds up to 32 inodes; each regular file can grow to 4 KiB.
pub struct RamFs {
    inner: Mutex<RamFsInner>,
}

impl RamFs {
    pub fn new() -> Self {
        let mut inner = RamFsInner::new_const();
        inner.ensure_initialized();
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Constructor for statics. The root directory is populated lazily on
    /// first use.
    pub const fn new_const() -> Self {
        Self {
            inner: Mutex::new(RamFsInner::new_const()),
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut RamFsInner) -> R) -> R {
        let mut inner = self.inner.lock();
        inner.ensure_initialized();
        f(&mut inner)
    }
}

impl Default for RamFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RamFs {
    fn name(&self) -> &'static str {
        "ramfs"
    }

    fn root_inode(&self) -> InodeId {
        ROOT_INODE
    }

    fn lookup(&self, parent: InodeId, name: &[u8]) -> VfsResult<InodeId> {
        self.with_inner(|inner| {
            let parent_inode = inner.get_inode(parent)?;
            if parent_inode.file_type != FileType::Directory {
                return Err(VfsError::NotDirectory);
            }
            parent_inode.lookup(name)
        })
    }

    fn stat(&self, inode: InodeId) -> VfsResult<FileStat> {
        self.with_inner(|inner| {
            let ram_inode = inner.get_inode(inode)?;
            let mut stat = match ram_inode.file_type {
                FileType::Directory => FileStat::new_directory(inode),
                _ => FileStat::new_file(inode, ram_inode.data_len as u64),
            };
            stat.mode = ram_inode.mode;
            Ok(stat)
        })
    }

    fn read(&self, inode: InodeId, offset: u64, buf: &mut [u8]) -> VfsResult<usize> {
        self.with_inner(|inner| {
            let ram_inode = inner.get_inode(inode)?;
            if ram_inode.file_type == FileType::Directory {
                return Err(VfsError::IsDirectory);
            }

            let Ok(offset) = usize::try_from(offset) else {
                return Ok(0);
            };
            if offset >= ram_inode.data_len {
                return Ok(0);
            }

            let to_read = buf.len().min(ram_inode.data_len - offset);
            buf[..to_read].copy_from_slice(&ram_inode.data[offset..offset + to_read]);
            Ok(to_read)
        })
    }

    fn write(&self, inode: InodeId, offset: u64, buf: &[u8]) -> VfsResult<usize> {
        self.with_inner(|inner| {
            let ram_inode = inner.regular_file_mut(inode)?;
            if buf.is_empty() {
                return Ok(0);
            }

            let end = usize::try_from(offset)
                .ok()
                .and_then(|start| start.checked_add(buf.len()))
                .filter(|&end| end <= RAMFS_MAX_FILE_SIZE)
                .ok_or(VfsError::NoSpace)?;
            let start = end - buf.len();

            ram_inode.data[start..end].copy_from_slice(buf);
            ram_inode.data_len = ram_inode.data_len.max(end);
            Ok(buf.len())
        })
    }

    fn create(&self, parent: InodeId, name: &[u8], file_type: FileType) -> VfsResult<InodeId> {
        self.with_inner(|inner| {
            {
                let parent_inode = inner.get_inode(parent)?;
                if parent_inode.file_type != FileType::Directory {
                    return Err(VfsError::NotDirectory);
                }
                if parent_inode.lookup(name).is_ok() {
                    return Err(VfsError::AlreadyExists);
                }
            }

            let new_id = inner.alloc_inode()?;
            inner.get_inode_mut(parent)?.add_dir_entry(name, new_id)?;

            let new_inode = &mut inner.inodes[new_id as usize];
            *new_inode = RamInode::empty();
            new_inode.in_use = true;
            new_inode.file_type = file_type;

            if file_type == FileType::Directory {
                new_inode.mode = 0o755;
                new_inode.add_dir_entry(b".", new_id)?;
                new_inode.add_dir_entry(b"..", parent)?;
            }

            Ok(new_id)
        })
    }

    fn truncate(&self, inode: InodeId, size: u64) -> VfsResult<()> {
        self.with_inner(|inner| {
            let ram_inode = inner.regular_file_mut(inode)?;

            let new_size = usize::try_from(size)
                .unwrap_or(usize::MAX)
                .min(RAMFS_MAX_FILE_SIZE);
            if new_size < ram_inode.data_len {
                ram_inode.data[new_size..ram_inode.data_len].fill(0);
            }
            ram_inode.data_len = new_size;

            Ok(())
        })
    }
}
