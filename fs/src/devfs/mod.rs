use core::sync::atomic::{AtomicU64, Ordering};

use crate::vfs::{FileStat, FileSystem, FileType, InodeId, VfsError, VfsResult};

const ROOT_INODE: InodeId = 1;
const NULL_INODE: InodeId = 2;
const ZERO_INODE: InodeId = 3;
const CONSOLE_INODE: InodeId = 4;

struct DeviceEntry {
    name: &'static [u8],
    inode: InodeId,
    major: u32,
    minor: u32,
}

static DEVICES: [DeviceEntry; 3] = [
    DeviceEntry {
        name: b"null",
        inode: NULL_INODE,
        major: 1,
        minor: 3,
    },
    DeviceEntry {
        name: b"zero",
        inode: ZERO_INODE,
        major: 1,
        minor: 5,
    },
    DeviceEntry {
        name: b"console",
        inode: CONSOLE_INODE,
        major: 5,
        minor: 1,
    },
];

/// Character devices under `/dev`. None of them is seekable.
pub struct DevFs {
    console_bytes: AtomicU64,
}

impl DevFs {
    pub const fn new() -> Self {
        Self {
            console_bytes: AtomicU64::new(0),
        }
    }

    /// Total bytes written to `/dev/console`.
    pub fn console_bytes(&self) -> u64 {
        self.console_bytes.load(Ordering::Relaxed)
    }
}

impl Default for DevFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for DevFs {
    fn name(&self) -> &'static str {
        "devfs"
    }

    fn root_inode(&self) -> InodeId {
        ROOT_INODE
    }

    fn lookup(&self, parent: InodeId, name: &[u8]) -> VfsResult<InodeId> {
        if parent != ROOT_INODE {
            return Err(VfsError::NotDirectory);
        }
        if name == b"." || name == b".." {
            return Ok(ROOT_INODE);
        }
        DEVICES
            .iter()
            .find(|dev| dev.name == name)
            .map(|dev| dev.inode)
            .ok_or(VfsError::NotFound)
    }

    fn stat(&self, inode: InodeId) -> VfsResult<FileStat> {
        if inode == ROOT_INODE {
            return Ok(FileStat::new_directory(ROOT_INODE));
        }
        DEVICES
            .iter()
            .find(|dev| dev.inode == inode)
            .map(|dev| FileStat::new_char_device(inode, dev.major, dev.minor))
            .ok_or(VfsError::NotFound)
    }

    fn read(&self, inode: InodeId, _offset: u64, buf: &mut [u8]) -> VfsResult<usize> {
        match inode {
            NULL_INODE | CONSOLE_INODE => Ok(0),
            ZERO_INODE => {
                buf.fill(0);
                Ok(buf.len())
            }
            ROOT_INODE => Err(VfsError::IsDirectory),
            _ => Err(VfsError::NotFound),
        }
    }

    fn write(&self, inode: InodeId, _offset: u64, buf: &[u8]) -> VfsResult<usize> {
        match inode {
            NULL_INODE | ZERO_INODE => Ok(buf.len()),
            CONSOLE_INODE => {
                self.console_bytes
                    .fetch_add(buf.len() as u64, Ordering::Relaxed);
                if let Ok(text) = core::str::from_utf8(buf) {
                    kfd_lib::klog_trace!("console: {}", text.trim_end());
                }
                Ok(buf.len())
            }
            ROOT_INODE => Err(VfsError::IsDirectory),
            _ => Err(VfsError::NotFound),
        }
    }

    fn create(&self, _parent: InodeId, _name: &[u8], _file_type: FileType) -> VfsResult<InodeId> {
        Err(VfsError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_semantics() {
        let fs = DevFs::new();
        let null = fs.lookup(ROOT_INODE, b"null").unwrap();
        let zero = fs.lookup(ROOT_INODE, b"zero").unwrap();
        let console = fs.lookup(ROOT_INODE, b"console").unwrap();

        let mut buf = [0xAAu8; 8];
        assert_eq!(fs.read(null, 0, &mut buf).unwrap(), 0);
        assert_eq!(fs.read(zero, 123, &mut buf).unwrap(), 8);
        assert_eq!(buf, [0u8; 8]);

        assert_eq!(fs.write(console, 0, b"hi\n").unwrap(), 3);
        assert_eq!(fs.console_bytes(), 3);

        assert_eq!(fs.lookup(ROOT_INODE, b"random"), Err(VfsError::NotFound));
        assert_eq!(
            fs.create(ROOT_INODE, b"x", FileType::Regular),
            Err(VfsError::ReadOnly)
        );
    }

    #[test]
    fn test_devices_are_not_seekable() {
        let fs = DevFs::new();
        for dev in &DEVICES {
            let stat = fs.stat(dev.inode).unwrap();
            assert_eq!(stat.file_type, FileType::CharDevice);
            assert!(!stat.file_type.is_seekable());
        }
        assert!(fs.stat(ROOT_INODE).unwrap().file_type.is_seekable());
    }
}
