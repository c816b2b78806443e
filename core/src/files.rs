//! Kernel-wide open-file table.

use kfd_fs::vfs::vfs_root;
use kfd_fs::{
    FileIo, FileioConfig, OpenFileTable, VfsResult, fileio_config_from_cmdline,
    vfs_init_builtin_filesystems,
};
use kfd_lib::klog_info;
use spin::Once;

static FILEIO_CONFIG: Once<FileioConfig> = Once::new();
static KERNEL_FILES: Once<OpenFileTable> = Once::new();

/// Mount the built-in filesystems and size the kernel open-file table from
/// `cmdline`. Later calls return the existing instance; their command line is
/// ignored.
pub fn fileio_init(cmdline: Option<&str>) -> VfsResult<FileIo<'static>> {
    let vfs = vfs_init_builtin_filesystems()?;
    let cfg = *FILEIO_CONFIG.call_once(|| fileio_config_from_cmdline(cmdline));
    let table = KERNEL_FILES.call_once(|| {
        klog_info!(
            "fileio: {} open-file entries, {} descriptors per process",
            cfg.max_files,
            cfg.max_fds
        );
        OpenFileTable::with_limit(cfg.max_files)
    });
    Ok(FileIo::new(table, vfs))
}

/// The kernel descriptor layer, once [`fileio_init`] has run.
pub fn kernel_fileio() -> Option<FileIo<'static>> {
    Some(FileIo::new(KERNEL_FILES.get()?, vfs_root()?))
}

/// Active limits; defaults until [`fileio_init`] has run.
pub fn fileio_config() -> FileioConfig {
    FILEIO_CONFIG.get().copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_once() {
        let io = fileio_init(Some("fileio.max_files=16 fileio.max_fds=8")).unwrap();
        assert_eq!(io.table().limit(), 16);
        assert_eq!(fileio_config().max_fds, 8);

        let again = fileio_init(Some("fileio.max_files=2")).unwrap();
        assert!(core::ptr::eq(io.table(), again.table()));
        assert_eq!(again.table().limit(), 16);

        let kernel = kernel_fileio().unwrap();
        assert!(core::ptr::eq(kernel.table(), io.table()));
    }
}
