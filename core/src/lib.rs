#![no_std]

#[cfg(test)]
extern crate std;

pub mod files;
pub mod process;
#[macro_use]
pub mod syscall;
pub mod user;


pub use files::{fileio_config, fileio_init, kernel_fileio};
pub use process::ProcessFiles;
pub use syscall::{SyscallArgs, syscall_handle};
pub use user::{UserMemory, UserPtrError, UserRegion};
