use kfd_fs::{DescriptorTable, FileIo, FileResult};
use kfd_lib::klog_debug;

use crate::files::fileio_config;

/// Descriptor state owned by one process.
pub struct ProcessFiles {
    pid: u32,
    table: DescriptorTable,
}

impl ProcessFiles {
    /// A fresh process with no descriptors, sized by the active limits.
    pub fn new(pid: u32) -> Self {
        Self::with_table(pid, DescriptorTable::with_limit(fileio_config().max_fds))
    }

    pub fn with_table(pid: u32, table: DescriptorTable) -> Self {
        Self { pid, table }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    /// Child of this process inheriting every open descriptor.
    pub fn fork(&self, files: FileIo<'_>, child_pid: u32) -> FileResult<Self> {
        let table = files.fork_table(&self.table)?;
        klog_debug!(
            "fileio: pid {} inherits {} descriptors from pid {}",
            child_pid,
            table.bound_count(),
            self.pid
        );
        Ok(Self::with_table(child_pid, table))
    }

    /// Tear down on exit, closing whatever is still open.
    pub fn exit(self, files: FileIo<'_>) -> usize {
        let closed = files.close_all(&self.table);
        klog_debug!("fileio: pid {} exited, {} descriptors closed", self.pid, closed);
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfd_abi::fs::{OpenFlags, SEEK_CUR};
    use kfd_fs::{OpenFileTable, vfs_init_builtin_filesystems};

    #[test]
    fn test_fork_then_exit() {
        let vfs = vfs_init_builtin_filesystems().unwrap();
        let table = OpenFileTable::new();
        let io = FileIo::new(&table, vfs);

        let parent = ProcessFiles::with_table(1, DescriptorTable::new());
        let flags = OpenFlags::RDWR | OpenFlags::CREAT | OpenFlags::TRUNC;
        let fd = io.open(parent.table(), b"/tmp/proc_fork", flags, 0o644).unwrap();
        io.write(parent.table(), fd, b"abc").unwrap();

        let child = parent.fork(io, 2).unwrap();
        assert_eq!(child.pid(), 2);
        assert_eq!(child.table().lookup(fd), parent.table().lookup(fd));
        let fref = parent.table().lookup(fd).unwrap();
        assert_eq!(table.ref_count(fref), Some(2));

        // Parent and child share one offset.
        io.write(child.table(), fd, b"de").unwrap();
        assert_eq!(io.lseek(parent.table(), fd, 0, SEEK_CUR), Ok(5));

        assert_eq!(child.exit(io), 1);
        assert_eq!(table.ref_count(fref), Some(1));
        assert_eq!(parent.exit(io), 1);
        assert_eq!(table.occupied(), 0);
    }
}
