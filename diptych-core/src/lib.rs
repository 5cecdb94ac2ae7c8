//! Crash-safe configuration store over two flash banks
//!
//! Persists one opaque binary blob on raw block-erasable flash with no
//! filesystem underneath. Two banks alternate as an append-only journal:
//! while one bank is being rewritten the other always holds an intact
//! copy, so a power cut at any instant leaves either the previous or the
//! newly committed configuration readable after the next boot.
//!
//! # On-flash format
//!
//! Each write attempt occupies one fixed-size slot:
//!
//! ```text
//! ┌───────┬──────────┬────────┬──────────┬───────────────┬─────────┐
//! │ MAGIC │ SEQUENCE │ LENGTH │ CHECKSUM │ PAYLOAD       │ PADDING │
//! │ 4B    │ 4B       │ 2B     │ 4B       │ 0..max bytes  │ erased  │
//! └───────┴──────────┴────────┴──────────┴───────────────┴─────────┘
//! ```
//!
//! All fields little-endian; the CRC-32 covers sequence, length and
//! payload. Slots fill a bank in strictly increasing address order, and
//! the sequence number totally orders records across both banks. Two
//! devices must share this exact layout to read each other's flash.
//!
//! # Usage
//!
//! ```ignore
//! let layout = Layout::new(BANK_SIZE, SLOT_SIZE);
//! let mut store = Store::open([bank_a, bank_b], layout)?;
//! store.save(blob)?;
//! let current = store.load();
//! ```
//!
//! The store assumes a single logical writer; platforms with several
//! tasks must serialize `load`/`save` with an external lock.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod error;
pub mod layout;
pub mod record;
pub mod rotate;
pub mod scan;
pub mod store;

pub use error::Error;
pub use layout::Layout;
pub use record::{Record, SlotState, HEADER_LEN, MAX_PAYLOAD_SIZE, MAX_SLOT_SIZE, RECORD_MAGIC};
pub use rotate::{BankId, Engine, Role};
pub use scan::{scan, ScanOutcome};
pub use store::Store;
