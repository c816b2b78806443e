#![no_std]

pub use kfd_abi::fs::{NAME_MAX as MAX_NAME_LEN, PATH_MAX as MAX_PATH_LEN};

pub mod devfs;
pub mod fileio;
pub mod ramfs;
pub mod vfs;


#[cfg(test)]
extern crate std;

pub use devfs::DevFs;
pub use fileio::*;
pub use ramfs::RamFs;
pub use vfs::{
    FileStat, FileSystem, FileType, InodeId, MountVfs, Vfs, VfsError, VfsHandle, VfsResult,
    vfs_init_builtin_filesystems, vfs_is_initialized,
};
