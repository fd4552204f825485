//! Unified error type for pico-pio-hid.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (with the `defmt` feature) for efficient
//! on-target logging.

use core::fmt;

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Descriptors
    /// A configuration descriptor needs at least one HID function.
    NoFunctions,

    /// More HID functions than the composite device supports.
    TooManyFunctions,

    /// Descriptor does not fit its fixed-size backing buffer.
    BufferOverflow,

    // Device engine
    /// The software USB engine refused to start.
    EngineInit(EngineInitError),

    /// A device handle has already been published.
    AlreadyPublished,
}

/// Why the software USB engine failed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineInitError {
    /// PIO block, state machine or DMA channel already claimed.
    PeripheralBusy,
    /// Pin or PIO assignment the engine cannot use.
    InvalidConfig,
    /// Engine rejected the descriptor set.
    InvalidDescriptor,
}

// Convenience conversions

impl From<EngineInitError> for Error {
    fn from(e: EngineInitError) -> Self {
        Error::EngineInit(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoFunctions => f.write_str("configuration has no HID functions"),
            Error::TooManyFunctions => f.write_str("too many HID functions"),
            Error::BufferOverflow => f.write_str("descriptor buffer overflow"),
            Error::EngineInit(e) => write!(f, "USB engine init failed: {:?}", e),
            Error::AlreadyPublished => f.write_str("device handle already published"),
        }
    }
}
