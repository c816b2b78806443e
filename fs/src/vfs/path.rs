use crate::vfs::mount::MountTable;
use crate::vfs::traits::{FileSystem, FileType, InodeId, VfsError, VfsResult};
use crate::{MAX_NAME_LEN, MAX_PATH_LEN};

/// An inode together with the filesystem that owns it.
#[derive(Clone, Copy)]
pub struct ResolvedPath {
    pub fs: &'static dyn FileSystem,
    pub inode: InodeId,
}

fn check_path(path: &[u8]) -> VfsResult<()> {
    if path.is_empty() || path[0] != b'/' {
        return Err(VfsError::InvalidPath);
    }
    if path.len() > MAX_PATH_LEN {
        return Err(VfsError::NameTooLong);
    }
    if path.contains(&0) {
        return Err(VfsError::InvalidPath);
    }
    Ok(())
}

fn components(relative: &[u8]) -> impl DoubleEndedIterator<Item = &[u8]> {
    relative
        .split(|&b| b == b'/')
        .filter(|c| !c.is_empty() && *c != b".")
}

fn walk<'a>(
    fs: &'static dyn FileSystem,
    parts: impl Iterator<Item = &'a [u8]>,
) -> VfsResult<ResolvedPath> {
    let mut inode = fs.root_inode();
    for name in parts {
        if name.len() > MAX_NAME_LEN {
            return Err(VfsError::NameTooLong);
        }
        if fs.stat(inode)?.file_type != FileType::Directory {
            return Err(VfsError::NotDirectory);
        }
        inode = fs.lookup(inode, name)?;
    }
    Ok(ResolvedPath { fs, inode })
}

/// Resolve an absolute path to the inode it names.
pub fn resolve_path(mounts: &MountTable, path: &[u8]) -> VfsResult<ResolvedPath> {
    check_path(path)?;
    let (fs, relative) = mounts.resolve(path)?;
    walk(fs, components(relative))
}

/// Resolve everything but the last component.
///
/// Returns the parent directory and the final name, which need not exist.
pub fn resolve_parent<'a>(
    mounts: &MountTable,
    path: &'a [u8],
) -> VfsResult<(ResolvedPath, &'a [u8])> {
    check_path(path)?;
    let (fs, relative) = mounts.resolve(path)?;

    let mut parts = components(relative);
    let Some(name) = parts.next_back() else {
        // The mount root itself has no parent within this filesystem.
        return Err(VfsError::InvalidPath);
    };
    if name == b".." {
        return Err(VfsError::InvalidPath);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(VfsError::NameTooLong);
    }

    let parent = walk(fs, parts)?;
    if parent.fs.stat(parent.inode)?.file_type != FileType::Directory {
        return Err(VfsError::NotDirectory);
    }
    Ok((parent, name))
}
