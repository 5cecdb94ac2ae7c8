//! Flash bank abstraction for the diptych configuration store
//!
//! This crate defines the hardware capability the store consumes: a pair
//! of independently erasable flash banks. Chip-specific drivers implement
//! [`FlashBank`] for their flash peripheral; the store itself never talks
//! to hardware directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application firmware                   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  diptych-core (store logic)             │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  diptych-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ chip-specific │       │  MemoryBank   │
//! │    driver     │       │ (host tests)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! All operations are synchronous, blocking calls: once a program or
//! erase command is issued it either completes or power is lost, and
//! recovery is the store's job, not the driver's.

#![no_std]
#![deny(unsafe_code)]

pub mod bank;
pub mod mem;

// Re-export key types at crate root for convenience
pub use bank::{FlashBank, FlashError};
pub use mem::MemoryBank;
