//! KFD Kernel-Userland ABI Types
//!
//! This crate provides the canonical definitions for the values shared between
//! the kernel file-descriptor layer and userland: errno codes, open flags,
//! seek modes, descriptor limits and syscall numbers. Having a single source
//! of truth keeps the two sides from drifting apart.
//!
//! All structs in this crate are `#[repr(C)]` for ABI stability.

#![no_std]
#![forbid(unsafe_code)]

pub mod errno;
pub mod fs;
pub mod syscall;

#[cfg(test)]
extern crate std;

pub use errno::*;
pub use fs::*;
pub use syscall::*;
