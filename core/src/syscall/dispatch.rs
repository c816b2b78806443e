use kfd_abi::errno::{ENOSYS, errno_name};
use kfd_fs::FileIo;
use kfd_lib::{klog_debug, klog_info};

use crate::process::ProcessFiles;
use crate::syscall::common::syscall_return;
use crate::syscall::context::{SyscallArgs, SyscallContext};
use crate::syscall::handlers::syscall_lookup;
use crate::user::UserMemory;

/// Run syscall `sysno` on behalf of `process` and produce the value for its
/// return register: the result, or a negated errno.
pub fn syscall_handle(
    files: FileIo<'_>,
    process: &ProcessFiles,
    user: &dyn UserMemory,
    sysno: u64,
    args: SyscallArgs,
) -> i64 {
    let Some(entry) = syscall_lookup(sysno) else {
        klog_info!("SYSCALL: Unknown syscall {} -> ENOSYS", sysno);
        return -(ENOSYS as i64);
    };
    let Some(handler) = entry.handler else {
        return -(ENOSYS as i64);
    };

    let ctx = SyscallContext::new(files, process, user, args);
    let result = handler(&ctx);
    if let Err(err) = result {
        klog_debug!(
            "SYSCALL: {} from pid {} -> {} ({})",
            entry.name,
            ctx.process_id(),
            errno_name(err.errno()),
            err
        );
    }
    syscall_return(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kfd_abi::errno::*;
    use kfd_abi::fs::*;
    use kfd_abi::syscall::*;
    use kfd_fs::{DescriptorTable, OpenFileTable, vfs_init_builtin_filesystems};

    use crate::user::UserRegion;

    const BASE: u64 = 0x10_0000;
    const PATH_AT: usize = 0;
    const BUF_AT: usize = 0x400;
    const BUF: u64 = BASE + BUF_AT as u64;

    struct Harness<'a> {
        files: FileIo<'a>,
        process: ProcessFiles,
        user: UserRegion<'a>,
    }

    impl Harness<'_> {
        fn call(&self, sysno: u64, a0: u64, a1: u64, a2: u64) -> i64 {
            syscall_handle(
                self.files,
                &self.process,
                &self.user,
                sysno,
                SyscallArgs::new(a0, a1, a2),
            )
        }

        fn open(&self, path: &[u8], flags: u32) -> i64 {
            self.user.poke(PATH_AT, path).unwrap();
            self.user.poke(PATH_AT + path.len(), &[0]).unwrap();
            self.call(SYSCALL_OPEN, BASE, flags as u64, 0o644)
        }

        fn write(&self, fd: i64, data: &[u8]) -> i64 {
            self.user.poke(BUF_AT, data).unwrap();
            self.call(SYSCALL_WRITE, fd as u64, BUF, data.len() as u64)
        }

        fn lseek(&self, fd: i64, pos: i64, whence: u32) -> i64 {
            self.call(SYSCALL_LSEEK, fd as u64, pos as u64, whence as u64)
        }
    }

    fn with_harness(f: impl FnOnce(&Harness<'_>, &OpenFileTable)) {
        let vfs = vfs_init_builtin_filesystems().unwrap();
        let table = OpenFileTable::new();
        let mut backing = [0u8; 4096];
        let harness = Harness {
            files: FileIo::new(&table, vfs),
            process: ProcessFiles::with_table(7, DescriptorTable::new()),
            user: UserRegion::new(BASE, &mut backing),
        };
        f(&harness, &table);
    }

    #[test]
    fn test_dup2_alias_scenario() {
        with_harness(|h, table| {
            let create = O_RDWR | O_CREAT | O_TRUNC;
            assert_eq!(h.open(b"/tmp/sys_dup2", create), 0);
            assert_eq!(h.write(0, b"first\n"), 6);
            assert_eq!(h.call(SYSCALL_DUP2, 0, 6, 0), 6);
            assert_eq!(h.write(6, b"second"), 6);
            assert_eq!(h.call(SYSCALL_CLOSE, 0, 0, 0), 0);
            assert_eq!(h.write(6, b"third-write\n"), 12);
            assert_eq!(h.lseek(6, 0, SEEK_CUR), 24);
            assert_eq!(h.write(0, b"x"), -(EBADF as i64));
            assert_eq!(h.call(SYSCALL_CLOSE, 6, 0, 0), 0);
            assert_eq!(table.occupied(), 0);

            let fd = h.open(b"/tmp/sys_dup2", O_RDONLY);
            assert_eq!(fd, 0);
            assert_eq!(h.call(SYSCALL_READ, fd as u64, BUF, 64), 24);
            let mut out = [0u8; 24];
            h.user.peek(BUF_AT, &mut out).unwrap();
            assert_eq!(&out, b"first\nsecondthird-write\n");
            assert_eq!(h.call(SYSCALL_CLOSE, fd as u64, 0, 0), 0);
        });
    }

    #[test]
    fn test_errors_are_negated_errno() {
        with_harness(|h, _| {
            assert_eq!(h.call(63, 0, 0, 0), -(ENOSYS as i64));
            assert_eq!(h.call(SYSCALL_CLOSE, 3, 0, 0), -(EBADF as i64));
            assert_eq!(h.call(SYSCALL_CLOSE, -1i64 as u64, 0, 0), -(EBADF as i64));
            assert_eq!(h.open(b"/tmp/sys_missing", O_RDONLY), -(ENOENT as i64));
            assert_eq!(h.open(b"/tmp", O_RDONLY), -(EISDIR as i64));
            assert_eq!(h.open(b"/dev/null", O_ACCMODE), -(EINVAL as i64));
            assert_eq!(h.call(SYSCALL_OPEN, 0, 0, 0), -(EFAULT as i64));

            let fd = h.open(b"/dev/console", O_WRONLY);
            assert_eq!(fd, 0);
            assert_eq!(h.lseek(fd, 0, SEEK_SET), -(ESPIPE as i64));
            assert_eq!(h.call(SYSCALL_READ, fd as u64, BUF, 4), -(EBADF as i64));
            assert_eq!(h.call(SYSCALL_WRITE, fd as u64, 0, 4), -(EFAULT as i64));
            assert_eq!(
                h.call(SYSCALL_WRITE, fd as u64, BASE + 8192, 4),
                -(EFAULT as i64)
            );
            assert_eq!(h.call(SYSCALL_CLOSE, fd as u64, 0, 0), 0);
        });
    }

    #[test]
    fn test_lseek_and_io_bounds() {
        with_harness(|h, _| {
            let fd = h.open(b"/tmp/sys_seek", O_RDWR | O_CREAT | O_TRUNC);
            assert_eq!(fd, 0);
            let data = [b'z'; 600];
            h.user.poke(BUF_AT, &data).unwrap();
            // One call moves at most USER_IO_MAX_BYTES.
            assert_eq!(h.call(SYSCALL_WRITE, 0, BUF, 600), 512);

            assert_eq!(h.lseek(fd, -12, SEEK_END), 500);
            assert_eq!(h.lseek(fd, -501, SEEK_CUR), -(EINVAL as i64));
            assert_eq!(h.lseek(fd, 0, 3), -(EINVAL as i64));
            assert_eq!(
                h.call(SYSCALL_LSEEK, 0, 0, u64::from(u32::MAX) + 1),
                -(EINVAL as i64)
            );
            assert_eq!(h.lseek(fd, 0, SEEK_CUR), 500);
            assert_eq!(h.call(SYSCALL_READ, 0, BUF, 100), 12);
            assert_eq!(h.call(SYSCALL_READ, 0, BUF, 100), 0);
            assert_eq!(h.call(SYSCALL_CLOSE, 0, 0, 0), 0);
        });
    }

    #[test]
    fn test_dup_and_fstat() {
        with_harness(|h, table| {
            let fd = h.open(b"/tmp/sys_stat", O_WRONLY | O_CREAT | O_TRUNC);
            assert_eq!(h.write(fd, b"0123456789"), 10);
            assert_eq!(h.call(SYSCALL_DUP, fd as u64, 0, 0), 1);
            let fref = h.process.table().lookup(1).unwrap();
            assert_eq!(table.ref_count(fref), Some(2));

            assert_eq!(h.call(SYSCALL_FSTAT, 1, BUF, 0), 0);
            let mut raw = [0u8; UserFileStat::SIZE];
            h.user.peek(BUF_AT, &mut raw).unwrap();
            assert_eq!(raw[0], FS_TYPE_FILE);
            assert_eq!(u64::from_le_bytes(raw[8..16].try_into().unwrap()), 10);

            assert_eq!(h.call(SYSCALL_FSTAT, 1, 0, 0), -(EFAULT as i64));
            assert_eq!(h.call(SYSCALL_FSTAT, 9, BUF, 0), -(EBADF as i64));
            assert_eq!(h.call(SYSCALL_DUP2, 1, OPEN_MAX as u64, 0), -(EBADF as i64));
            assert_eq!(h.call(SYSCALL_DUP2, 1, 1, 0), 1);

            assert_eq!(h.process.table().bound_count(), 2);
            assert_eq!(h.files.close_all(h.process.table()), 2);
        });
    }
}
