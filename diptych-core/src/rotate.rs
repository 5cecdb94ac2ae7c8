//! Bank rotation engine
//!
//! Owns the two banks and the cached state derived from them: which
//! bank is active, where the next append goes, and the last committed
//! sequence number. The cache is never the source of truth; whenever it
//! cannot be trusted (after a flash failure) it is re-derived by
//! scanning, which is also how power-loss recovery works.
//!
//! The crash-safety rule driving every transition: a bank is only ever
//! erased when the other bank already holds a confirmed newer record.
//! Erasing the superseded bank is deferred until it becomes the switch
//! target, which also keeps the common append path free of the erase
//! latency.

use heapless::Vec;

use diptych_hal::FlashBank;

use crate::error::Error;
use crate::layout::Layout;
use crate::record::{encode_slot, Record, MAX_SLOT_SIZE};
use crate::scan::scan;

/// Identity of one of the two banks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BankId {
    A = 0,
    B = 1,
}

impl BankId {
    /// The other bank
    pub fn other(self) -> Self {
        match self {
            BankId::A => BankId::B,
            BankId::B => BankId::A,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Runtime role of a bank
///
/// Roles are state, not identity: they swap on every switch. Only the
/// engine transitions them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Holds the latest committed configuration, receives appends
    Active,
    /// Holds stale or no data; erase candidate on the next switch
    Standby,
}

/// Rotation engine over two flash banks
pub struct Engine<B: FlashBank> {
    banks: [B; 2],
    layout: Layout,
    active: BankId,
    next_free: Option<usize>,
    last_sequence: u32,
    latest: Option<Record>,
    /// Set after a flash failure; forces a re-scan before the cached
    /// state is used again
    dirty: bool,
}

impl<B: FlashBank> Engine<B> {
    /// Build the engine by scanning both banks
    ///
    /// The bank holding the record with the higher sequence number
    /// becomes active (a bank with no record compares lowest). Virgin
    /// flash leaves bank A active with no configuration; the first
    /// commit initializes it.
    pub fn start(banks: [B; 2], layout: Layout) -> Result<Self, Error> {
        if !layout.is_valid() {
            return Err(Error::InvalidLayout);
        }

        let mut engine = Self {
            banks,
            layout,
            active: BankId::A,
            next_free: Some(0),
            last_sequence: 0,
            latest: None,
            dirty: false,
        };
        engine.rescan()?;
        Ok(engine)
    }

    /// Re-derive the cached state from flash contents
    fn rescan(&mut self) -> Result<(), Error> {
        let outcome_a = scan(&self.banks[BankId::A.index()], &self.layout)?;
        let outcome_b = scan(&self.banks[BankId::B.index()], &self.layout)?;

        let winner = match (&outcome_a.latest, &outcome_b.latest) {
            (Some((_, a)), Some((_, b))) if b.sequence > a.sequence => BankId::B,
            (Some(_), _) => BankId::A,
            (None, Some(_)) => BankId::B,
            (None, None) => BankId::A,
        };

        let outcome = match winner {
            BankId::A => outcome_a,
            BankId::B => outcome_b,
        };

        self.active = winner;
        // A torn slot is never reprogrammed in place: NOR programming
        // can only clear bits, so the residue of the interrupted write
        // would corrupt the new image while `program` still reports
        // success. Treat the bank as full instead; the next commit
        // rotates onto a freshly erased bank.
        self.next_free = if outcome.terminated_early {
            None
        } else {
            outcome.next_free
        };
        self.latest = outcome.latest.map(|(_, record)| record);
        self.last_sequence = self.latest.as_ref().map_or(0, |r| r.sequence);
        self.dirty = false;
        Ok(())
    }

    /// Durably commit a new configuration
    ///
    /// Appends into the active bank when it has room. When it is full,
    /// switches: erase the standby bank, write the record into its
    /// first slot, and flip roles only once that write is confirmed.
    /// The superseded bank keeps its history as the fallback copy.
    ///
    /// On a flash failure the committed state is unchanged and the
    /// cache is re-derived before the next operation, so retrying is
    /// safe.
    pub fn commit(&mut self, payload: &[u8]) -> Result<(), Error> {
        if payload.len() > self.layout.max_payload() {
            return Err(Error::PayloadTooLarge);
        }
        if self.dirty {
            self.rescan()?;
        }

        let sequence = self.last_sequence.wrapping_add(1);
        let mut buf = [0u8; MAX_SLOT_SIZE];
        let image = &mut buf[..self.layout.slot_size];
        encode_slot(sequence, payload, B::ERASED, image)?;
        let stored = Vec::from_slice(payload).map_err(|_| Error::PayloadTooLarge)?;

        match self.next_free {
            Some(slot) => {
                if let Err(e) = self.banks[self.active.index()].program(slot * self.layout.slot_size, image) {
                    self.dirty = true;
                    return Err(e.into());
                }
                self.next_free = if slot + 1 < self.layout.slots_per_bank() {
                    Some(slot + 1)
                } else {
                    None
                };
            }
            None => {
                let target = self.active.other();

                if let Err(e) = self.banks[target.index()].erase() {
                    self.dirty = true;
                    return Err(e.into());
                }
                if let Err(e) = self.banks[target.index()].program(0, image) {
                    self.dirty = true;
                    return Err(e.into());
                }

                // Roles flip only after the write is confirmed; until
                // here the old bank was still the valid fallback.
                self.active = target;
                self.next_free = if self.layout.slots_per_bank() > 1 {
                    Some(1)
                } else {
                    None
                };
            }
        }

        self.last_sequence = sequence;
        self.latest = Some(Record {
            sequence,
            payload: stored,
        });
        Ok(())
    }

    /// Erase both banks and forget any configuration
    pub fn reset(&mut self) -> Result<(), Error> {
        for bank in &mut self.banks {
            if let Err(e) = bank.erase() {
                self.dirty = true;
                return Err(e.into());
            }
        }
        self.active = BankId::A;
        self.next_free = Some(0);
        self.last_sequence = 0;
        self.latest = None;
        self.dirty = false;
        Ok(())
    }

    /// The latest committed record, if any
    pub fn latest(&self) -> Option<&Record> {
        self.latest.as_ref()
    }

    /// The currently active bank
    pub fn active(&self) -> BankId {
        self.active
    }

    /// Runtime role of a bank
    pub fn role(&self, bank: BankId) -> Role {
        if bank == self.active {
            Role::Active
        } else {
            Role::Standby
        }
    }

    /// The last committed sequence number (0 before any commit)
    pub fn last_sequence(&self) -> u32 {
        self.last_sequence
    }

    /// Release the banks, consuming the engine
    pub fn into_banks(self) -> [B; 2] {
        self.banks
    }

    #[cfg(test)]
    pub(crate) fn banks(&self) -> &[B; 2] {
        &self.banks
    }
}
