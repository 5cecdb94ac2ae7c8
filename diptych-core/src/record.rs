//! Record encoding and decoding
//!
//! A record is one write attempt, occupying one slot:
//! - MAGIC (4B): identifies a record vs. erased or garbage flash
//! - SEQUENCE (4B): global monotonically increasing write counter
//! - LENGTH (2B): payload length in bytes
//! - CHECKSUM (4B): CRC-32 of SEQUENCE, LENGTH and PAYLOAD
//! - PAYLOAD (0..max bytes): the opaque configuration blob
//! - PADDING: erase value up to the slot size
//!
//! All fields little-endian. The checksum is what catches the central
//! failure mode: a slot whose programming was cut short by power loss.

use heapless::Vec;

use crate::error::Error;

/// Magic constant marking a valid record ("DPTY")
///
/// Distinct from both common erase patterns (all-0xFF, all-0x00), so an
/// erased slot can never alias a record header.
pub const RECORD_MAGIC: u32 = 0x4450_5459;

/// Fixed header size: magic + sequence + length + checksum
pub const HEADER_LEN: usize = 4 + 4 + 2 + 4;

/// Largest supported slot; bounds the in-RAM slot buffer
pub const MAX_SLOT_SIZE: usize = 512;

/// Largest payload any layout can hold
pub const MAX_PAYLOAD_SIZE: usize = MAX_SLOT_SIZE - HEADER_LEN;

/// A decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Record {
    /// Global write counter; totally orders records across both banks
    pub sequence: u32,
    /// The opaque configuration blob
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

/// Classification of one slot's raw bytes
///
/// An explicit outcome rather than an error: the scanner keeps working
/// after a negative result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// Magic, bounds and checksum all verify
    Valid(Record),
    /// Untouched since the last erase
    Absent,
    /// Anything else, typically a write cut short by power loss
    Corrupt,
}

/// Encode a record into a slot image
///
/// `out` must be exactly one slot long; padding is filled with the
/// bank's erase value so programming the image never flips pad bytes
/// away from their erased state.
pub fn encode_slot(
    sequence: u32,
    payload: &[u8],
    erased: u8,
    out: &mut [u8],
) -> Result<(), Error> {
    if out.len() < HEADER_LEN {
        return Err(Error::InvalidLayout);
    }
    if payload.len() > MAX_PAYLOAD_SIZE || payload.len() > out.len() - HEADER_LEN {
        return Err(Error::PayloadTooLarge);
    }

    let length = payload.len() as u16;
    let checksum = record_checksum(sequence, length, payload);

    out[0..4].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
    out[4..8].copy_from_slice(&sequence.to_le_bytes());
    out[8..10].copy_from_slice(&length.to_le_bytes());
    out[10..14].copy_from_slice(&checksum.to_le_bytes());
    out[HEADER_LEN..HEADER_LEN + payload.len()].copy_from_slice(payload);
    for byte in &mut out[HEADER_LEN + payload.len()..] {
        *byte = erased;
    }

    Ok(())
}

/// Classify a slot's raw bytes
pub fn decode_slot(raw: &[u8], erased: u8) -> SlotState {
    if raw.iter().all(|&b| b == erased) {
        return SlotState::Absent;
    }
    if raw.len() < HEADER_LEN {
        return SlotState::Corrupt;
    }

    let magic = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    if magic != RECORD_MAGIC {
        return SlotState::Corrupt;
    }

    let sequence = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    let length = u16::from_le_bytes([raw[8], raw[9]]);
    let checksum = u32::from_le_bytes([raw[10], raw[11], raw[12], raw[13]]);

    let len = length as usize;
    if len > MAX_PAYLOAD_SIZE || len > raw.len() - HEADER_LEN {
        return SlotState::Corrupt;
    }

    let payload = &raw[HEADER_LEN..HEADER_LEN + len];
    if checksum != record_checksum(sequence, length, payload) {
        return SlotState::Corrupt;
    }

    let Ok(stored) = Vec::from_slice(payload) else {
        return SlotState::Corrupt;
    };

    SlotState::Valid(Record {
        sequence,
        payload: stored,
    })
}

/// CRC-32 over sequence, length and payload
fn record_checksum(sequence: u32, length: u16, payload: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    crc = crc32_update(crc, &sequence.to_le_bytes());
    crc = crc32_update(crc, &length.to_le_bytes());
    crc = crc32_update(crc, payload);
    !crc
}

/// CRC-32 update function (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
