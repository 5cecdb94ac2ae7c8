//! Bank and slot geometry
//!
//! Geometry is a build-time decision of the firmware, not something
//! auto-detected from hardware: both banks share one `Layout`, and a
//! device can only read flash written with the same values.

use crate::record::{HEADER_LEN, MAX_SLOT_SIZE};

/// Geometry of the two flash banks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Layout {
    /// Size of each bank in bytes
    pub bank_size: usize,
    /// Size of each slot in bytes (header + max payload + padding)
    pub slot_size: usize,
}

impl Layout {
    /// Create a layout
    pub const fn new(bank_size: usize, slot_size: usize) -> Self {
        Self {
            bank_size,
            slot_size,
        }
    }

    /// Number of record slots per bank
    pub const fn slots_per_bank(&self) -> usize {
        self.bank_size / self.slot_size
    }

    /// Largest payload one slot can hold
    pub const fn max_payload(&self) -> usize {
        self.slot_size.saturating_sub(HEADER_LEN)
    }

    /// Check the geometry is usable
    ///
    /// A slot must fit its header plus at least one payload byte and
    /// stay within the fixed in-RAM slot buffer; a bank must hold at
    /// least one slot.
    pub const fn is_valid(&self) -> bool {
        self.slot_size > HEADER_LEN
            && self.slot_size <= MAX_SLOT_SIZE
            && self.bank_size >= self.slot_size
    }
}
