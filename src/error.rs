//! Unified error type for the ledlink firmware.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

use defmt::Format;
use ledlink::protocol::{EncodeError, SessionError};

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, Format)]
pub enum Error {
    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    /// The scan window closed without the display advertising.
    DisplayNotFound,

    /// Connection to the display was lost unexpectedly.
    Disconnected,

    // Protocol
    /// A request could not be encoded.
    Encode(EncodeError),

    /// A request/response exchange failed.
    Session(SessionError),

    /// Operation timed out.
    Timeout,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, Format)]
pub enum BleError {
    /// Scan was cancelled or could not start.
    ScanFailed,
    /// Connection attempt failed.
    ConnectFailed,
    /// The LED service or one of its characteristics was not found.
    DiscoveryFailed,
    /// Enabling notifications on the notify characteristic failed.
    NotifyFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Error::Encode(e)
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Disconnected => Error::Disconnected,
            SessionError::Timeout => Error::Timeout,
            SessionError::Encode(e) => Error::Encode(e),
            other => Error::Session(other),
        }
    }
}
