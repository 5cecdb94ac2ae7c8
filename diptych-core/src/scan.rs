//! Bank scanning
//!
//! Reconstructs what a bank holds from its raw contents. Because slots
//! fill strictly in address order, the first non-valid slot is the
//! append point and nothing beyond it was ever written; the scan stops
//! there instead of walking the whole bank.

use diptych_hal::FlashBank;

use crate::error::Error;
use crate::layout::Layout;
use crate::record::{decode_slot, Record, SlotState, MAX_SLOT_SIZE};

/// Result of scanning one bank
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanOutcome {
    /// Slot index and record with the highest sequence number, if any
    pub latest: Option<(usize, Record)>,
    /// First slot an append may target; `None` when the bank is full
    pub next_free: Option<usize>,
    /// A corrupt slot ended the scan (diagnostic; the slot itself is
    /// simply reused as the append point)
    pub terminated_early: bool,
}

/// Scan a bank for its latest valid record and append point
///
/// Walks slots from index 0. A valid record with a sequence number at
/// least as high as any seen so far becomes the latest; the first
/// `Absent` slot is the append point; a `Corrupt` slot (a write that
/// never finished) is the append point too and is flagged. Either way
/// the slots beyond are guaranteed unwritten and are not visited.
pub fn scan<B: FlashBank>(bank: &B, layout: &Layout) -> Result<ScanOutcome, Error> {
    if !layout.is_valid() {
        return Err(Error::InvalidLayout);
    }

    let mut buf = [0u8; MAX_SLOT_SIZE];
    let slot = &mut buf[..layout.slot_size];

    let mut outcome = ScanOutcome {
        latest: None,
        next_free: None,
        terminated_early: false,
    };

    for index in 0..layout.slots_per_bank() {
        bank.read(index * layout.slot_size, slot)?;

        match decode_slot(slot, B::ERASED) {
            SlotState::Valid(record) => {
                let newer = outcome
                    .latest
                    .as_ref()
                    .map_or(true, |(_, latest)| record.sequence >= latest.sequence);
                if newer {
                    outcome.latest = Some((index, record));
                }
            }
            SlotState::Absent => {
                outcome.next_free = Some(index);
                return Ok(outcome);
            }
            SlotState::Corrupt => {
                outcome.next_free = Some(index);
                outcome.terminated_early = true;
                return Ok(outcome);
            }
        }
    }

    Ok(outcome)
}
