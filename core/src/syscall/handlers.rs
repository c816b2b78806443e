use kfd_abi::syscall::*;

use crate::syscall::common::SyscallResult;
use crate::syscall::context::SyscallContext;
use crate::syscall::fs::{
    syscall_dup, syscall_dup2, syscall_fs_close, syscall_fs_open, syscall_fs_read,
    syscall_fs_write, syscall_fstat, syscall_lseek,
};

pub type SyscallHandler = fn(&SyscallContext<'_>) -> SyscallResult;

#[derive(Copy, Clone)]
pub struct SyscallEntry {
    pub handler: Option<SyscallHandler>,
    pub name: &'static str,
}

impl SyscallEntry {
    const EMPTY: Self = Self {
        handler: None,
        name: "",
    };

    const fn new(name: &'static str, handler: SyscallHandler) -> Self {
        Self {
            handler: Some(handler),
            name,
        }
    }
}

const SYSCALL_TABLE_SIZE: usize = 32;

static SYSCALL_TABLE: [SyscallEntry; SYSCALL_TABLE_SIZE] = {
    let mut table = [SyscallEntry::EMPTY; SYSCALL_TABLE_SIZE];
    table[SYSCALL_OPEN as usize] = SyscallEntry::new("open", syscall_fs_open);
    table[SYSCALL_CLOSE as usize] = SyscallEntry::new("close", syscall_fs_close);
    table[SYSCALL_READ as usize] = SyscallEntry::new("read", syscall_fs_read);
    table[SYSCALL_WRITE as usize] = SyscallEntry::new("write", syscall_fs_write);
    table[SYSCALL_LSEEK as usize] = SyscallEntry::new("lseek", syscall_lseek);
    table[SYSCALL_FSTAT as usize] = SyscallEntry::new("fstat", syscall_fstat);
    table[SYSCALL_DUP as usize] = SyscallEntry::new("dup", syscall_dup);
    table[SYSCALL_DUP2 as usize] = SyscallEntry::new("dup2", syscall_dup2);
    table
};

pub fn syscall_lookup(sysno: u64) -> Option<&'static SyscallEntry> {
    let idx = usize::try_from(sysno).ok()?;
    SYSCALL_TABLE
        .get(idx)
        .filter(|entry| entry.handler.is_some())
}
