#[macro_use]
pub mod macros;
pub mod common;
pub mod context;
pub mod dispatch;
pub mod fs;
pub mod handlers;

pub use context::{SyscallArgs, SyscallContext};
pub use dispatch::syscall_handle;
