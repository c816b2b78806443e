//! Userland memory access for syscall handlers.
//!
//! Handlers never dereference user addresses themselves. They go through a
//! [`UserMemory`] implementation, which validates the address range before
//! copying and reports failures as [`UserPtrError`].

use spin::Mutex;

/// Reasons a user address cannot be copied from or to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum UserPtrError {
    /// Pointer is null (address == 0)
    Null = 1,
    /// Address is outside the user window
    OutOfUserRange = 2,
    /// Address + length would overflow u64
    Overflow = 3,
    /// Copy operation failed during actual memory transfer
    CopyFailed = 4,
}

pub trait UserMemory: Sync {
    fn copy_from_user(&self, src: u64, dst: &mut [u8]) -> Result<(), UserPtrError>;

    fn copy_to_user(&self, dst: u64, src: &[u8]) -> Result<(), UserPtrError>;

    /// Copy a NUL-terminated string starting at `src` into `dst`.
    ///
    /// Returns the string length without the terminator, or `None` when no
    /// terminator was found within `dst.len()` bytes.
    fn copy_str_from_user(&self, src: u64, dst: &mut [u8]) -> Result<Option<usize>, UserPtrError> {
        if src == 0 {
            return Err(UserPtrError::Null);
        }
        for (i, slot) in dst.iter_mut().enumerate() {
            let addr = src.checked_add(i as u64).ok_or(UserPtrError::Overflow)?;
            let mut byte = [0u8; 1];
            self.copy_from_user(addr, &mut byte)?;
            if byte[0] == 0 {
                return Ok(Some(i));
            }
            *slot = byte[0];
        }
        Ok(None)
    }
}

/// A window of user address space backed by a kernel buffer.
///
/// Addresses `[base, base + len)` map onto the buffer; anything else faults.
pub struct UserRegion<'a> {
    base: u64,
    bytes: Mutex<&'a mut [u8]>,
}

impl<'a> UserRegion<'a> {
    pub fn new(base: u64, bytes: &'a mut [u8]) -> Self {
        Self {
            base,
            bytes: Mutex::new(bytes),
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// Fill the window from `offset` with `data`, as a user program would.
    pub fn poke(&self, offset: usize, data: &[u8]) -> Result<(), UserPtrError> {
        let addr = self
            .base
            .checked_add(offset as u64)
            .ok_or(UserPtrError::Overflow)?;
        self.copy_to_user(addr, data)
    }

    /// Read back `dst.len()` bytes at `offset`.
    pub fn peek(&self, offset: usize, dst: &mut [u8]) -> Result<(), UserPtrError> {
        let addr = self
            .base
            .checked_add(offset as u64)
            .ok_or(UserPtrError::Overflow)?;
        self.copy_from_user(addr, dst)
    }

    fn range(&self, addr: u64, len: usize, window: usize) -> Result<(usize, usize), UserPtrError> {
        if addr == 0 {
            return Err(UserPtrError::Null);
        }
        let end = addr
            .checked_add(len as u64)
            .ok_or(UserPtrError::Overflow)?;
        let window_end = self.base.saturating_add(window as u64);
        if addr < self.base || end > window_end {
            return Err(UserPtrError::OutOfUserRange);
        }
        let start = (addr - self.base) as usize;
        Ok((start, start + len))
    }
}

impl UserMemory for UserRegion<'_> {
    fn copy_from_user(&self, src: u64, dst: &mut [u8]) -> Result<(), UserPtrError> {
        let bytes = self.bytes.lock();
        let (start, end) = self.range(src, dst.len(), bytes.len())?;
        dst.copy_from_slice(&bytes[start..end]);
        Ok(())
    }

    fn copy_to_user(&self, dst: u64, src: &[u8]) -> Result<(), UserPtrError> {
        let mut bytes = self.bytes.lock();
        let window = bytes.len();
        let (start, end) = self.range(dst, src.len(), window)?;
        bytes[start..end].copy_from_slice(src);
        Ok(())
    }
}
