//! RAM-backed flash bank for host testing
//!
//! Models the properties of real NOR flash that matter to the store:
//! programming can only move bits toward the programmed value (modelled
//! as AND), and a program or erase may be cut short by power loss.
//! Fault injection hooks let tests cut a write at any byte offset.

use crate::bank::{FlashBank, FlashError};

/// A memory-buffer backed flash bank
///
/// `N` is the bank capacity in bytes, `EMPTY` the erase value
/// (0xFF by default, matching most NOR parts).
#[derive(Debug, Clone)]
pub struct MemoryBank<const N: usize, const EMPTY: u8 = 0xFF> {
    data: [u8; N],
    interrupt_after: Option<usize>,
    fail_next_erase: bool,
}

impl<const N: usize, const EMPTY: u8> MemoryBank<N, EMPTY> {
    /// Create a bank in its freshly erased state
    pub fn new() -> Self {
        Self {
            data: [EMPTY; N],
            interrupt_after: None,
            fail_next_erase: false,
        }
    }

    /// Cut the next `program` call after `bytes` bytes
    ///
    /// The call writes only the first `bytes` bytes of its data and then
    /// reports [`FlashError::Program`], simulating power loss mid-write.
    /// If the next program is shorter than `bytes` it completes normally.
    /// The hook is consumed by that one call.
    pub fn interrupt_after(&mut self, bytes: usize) {
        self.interrupt_after = Some(bytes);
    }

    /// Make the next `erase` call fail without touching the contents
    pub fn fail_next_erase(&mut self) {
        self.fail_next_erase = true;
    }

    /// Raw bank contents, for assertions
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Mutable bank contents, for seeding pre-corrupted flash images
    pub fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl<const N: usize, const EMPTY: u8> Default for MemoryBank<N, EMPTY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const EMPTY: u8> FlashBank for MemoryBank<N, EMPTY> {
    const ERASED: u8 = EMPTY;

    fn capacity(&self) -> usize {
        N
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), FlashError> {
        let end = offset.checked_add(buf.len()).ok_or(FlashError::OutOfBounds)?;
        if end > N {
            return Err(FlashError::OutOfBounds);
        }
        buf.copy_from_slice(&self.data[offset..end]);
        Ok(())
    }

    fn program(&mut self, offset: usize, data: &[u8]) -> Result<(), FlashError> {
        let end = offset.checked_add(data.len()).ok_or(FlashError::OutOfBounds)?;
        if end > N {
            return Err(FlashError::OutOfBounds);
        }

        let written = match self.interrupt_after.take() {
            Some(limit) if limit < data.len() => limit,
            _ => data.len(),
        };

        // NOR programming can only clear bits toward the target value
        // (set bits, for parts that erase to 0x00), modelled as AND/OR.
        for (cell, &byte) in self.data[offset..offset + written].iter_mut().zip(data) {
            if EMPTY == 0x00 {
                *cell |= byte;
            } else {
                *cell &= byte;
            }
        }

        if written < data.len() {
            Err(FlashError::Program)
        } else {
            Ok(())
        }
    }

    fn erase(&mut self) -> Result<(), FlashError> {
        if self.fail_next_erase {
            self.fail_next_erase = false;
            return Err(FlashError::Erase);
        }
        self.data = [EMPTY; N];
        Ok(())
    }
}
