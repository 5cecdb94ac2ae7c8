//! Flash bank trait and error types
//!
//! A bank is one fixed-size, independently erasable region of flash.
//! The configuration store owns exactly two of them and alternates
//! between them; it never addresses flash outside a bank.

/// Errors from flash bank operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Program (write) operation failed or was interrupted
    Program,
    /// Erase operation failed or was interrupted
    Erase,
    /// Access outside the bank's capacity
    OutOfBounds,
}

/// One independently erasable flash bank
///
/// Implementations map a region of a flash peripheral to offsets
/// `0..capacity()`. The store requires:
/// - `read` returns exactly the bytes last programmed (or `ERASED`
///   where nothing was programmed since the last erase),
/// - `program` is byte-exact with no partial-success reporting beyond
///   success/failure,
/// - `erase` resets the whole bank to `ERASED`.
///
/// Program and erase may fail or be interrupted by power loss; the
/// store recovers by re-scanning, so drivers need no rollback logic.
pub trait FlashBank {
    /// Byte value the bank holds after an erase cycle
    ///
    /// 0xFF on most NOR flash; some parts erase to 0x00.
    const ERASED: u8;

    /// Total bank size in bytes
    fn capacity(&self) -> usize;

    /// Read `buf.len()` bytes starting at `offset`
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Program `data` starting at `offset`
    fn program(&mut self, offset: usize, data: &[u8]) -> Result<(), FlashError>;

    /// Erase the entire bank back to `ERASED`
    fn erase(&mut self) -> Result<(), FlashError>;
}
