use spin::Once;

use crate::devfs::DevFs;
use crate::ramfs::RamFs;
use crate::vfs::mount::MountVfs;
use crate::vfs::traits::VfsResult;

static ROOT_RAMFS: RamFs = RamFs::new_const();
static TMP_RAMFS: RamFs = RamFs::new_const();
static DEVFS: DevFs = DevFs::new();
static KERNEL_VFS: MountVfs = MountVfs::new();
static VFS_READY: Once<VfsResult<()>> = Once::new();

/// Mount the built-in filesystems: ramfs at `/` and `/tmp`, devfs at `/dev`.
///
/// Safe to call more than once; only the first call mounts anything.
pub fn vfs_init_builtin_filesystems() -> VfsResult<&'static MountVfs> {
    let result = VFS_READY.call_once(|| {
        KERNEL_VFS.mount(b"/", &ROOT_RAMFS)?;
        KERNEL_VFS.mount(b"/tmp", &TMP_RAMFS)?;
        KERNEL_VFS.mount(b"/dev", &DEVFS)?;
        kfd_lib::klog_info!("vfs: built-in filesystems mounted");
        Ok(())
    });
    (*result).map(|()| &KERNEL_VFS)
}

pub fn vfs_is_initialized() -> bool {
    matches!(VFS_READY.get(), Some(Ok(())))
}

/// The kernel VFS, if [`vfs_init_builtin_filesystems`] has succeeded.
pub fn vfs_root() -> Option<&'static MountVfs> {
    vfs_is_initialized().then_some(&KERNEL_VFS)
}
