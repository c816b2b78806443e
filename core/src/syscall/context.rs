use kfd_fs::{DescriptorTable, FileIo};

use crate::process::ProcessFiles;
use crate::user::UserMemory;

/// Raw syscall arguments, in register order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyscallArgs {
    pub arg0: u64,
    pub arg1: u64,
    pub arg2: u64,
    pub arg3: u64,
    pub arg4: u64,
    pub arg5: u64,
}

/// Everything a handler may touch: the caller's descriptors, the descriptor
/// layer and the caller's address space.
pub struct SyscallContext<'a> {
    files: FileIo<'a>,
    process: &'a ProcessFiles,
    user: &'a dyn UserMemory,
    args: SyscallArgs,
}

impl<'a> SyscallContext<'a> {
    pub fn new(
        files: FileIo<'a>,
        process: &'a ProcessFiles,
        user: &'a dyn UserMemory,
        args: SyscallArgs,
    ) -> Self {
        Self {
            files,
            process,
            user,
            args,
        }
    }

    #[inline]
    pub fn args(&self) -> &SyscallArgs {
        &self.args
    }

    #[inline]
    pub fn files(&self) -> FileIo<'a> {
        self.files
    }

    #[inline]
    pub fn process_id(&self) -> u32 {
        self.process.pid()
    }

    /// The caller's descriptor table.
    #[inline]
    pub fn fds(&self) -> &'a DescriptorTable {
        self.process.table()
    }

    #[inline]
    pub fn user(&self) -> &'a dyn UserMemory {
        self.user
    }
}

/// Registers hold descriptors as sign-extended `int`s. Anything that does
/// not fit maps to `-1`, which is never a valid descriptor.
#[inline]
fn reg_to_fd(reg: u64) -> i32 {
    i32::try_from(reg as i64).unwrap_or(-1)
}

impl SyscallArgs {
    pub const fn new(arg0: u64, arg1: u64, arg2: u64) -> Self {
        Self {
            arg0,
            arg1,
            arg2,
            arg3: 0,
            arg4: 0,
            arg5: 0,
        }
    }

    #[inline]
    pub fn arg0_fd(&self) -> i32 {
        reg_to_fd(self.arg0)
    }

    #[inline]
    pub fn arg1_u32(&self) -> u32 {
        self.arg1 as u32
    }
    #[inline]
    pub fn arg1_i64(&self) -> i64 {
        self.arg1 as i64
    }
    #[inline]
    pub fn arg1_fd(&self) -> i32 {
        reg_to_fd(self.arg1)
    }

    #[inline]
    pub fn arg2_u32(&self) -> u32 {
        self.arg2 as u32
    }
    #[inline]
    pub fn arg2_usize(&self) -> usize {
        usize::try_from(self.arg2).unwrap_or(usize::MAX)
    }
}
