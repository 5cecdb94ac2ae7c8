//! Store error type

use diptych_hal::FlashError;

/// Errors surfaced by the public store operations
///
/// A corrupt record on flash is deliberately not an error: the scanner
/// classifies it and treats it as "no newer record here", so it never
/// reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Payload exceeds what a slot can hold; rejected before any flash
    /// access, the store is unchanged
    PayloadTooLarge,
    /// Bank/slot geometry is unusable or the banks are too small for it
    InvalidLayout,
    /// Hardware-reported flash failure; the previous configuration
    /// remains readable, the cached state is re-derived on the next
    /// operation
    Flash(FlashError),
}

impl From<FlashError> for Error {
    fn from(e: FlashError) -> Self {
        Error::Flash(e)
    }
}
