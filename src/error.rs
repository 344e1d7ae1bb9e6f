//! Error types for the bodyscale-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    PlatformUnsupported,

    /// The operator dismissed device selection. Retryable: run the
    /// pipeline again from discovery.
    #[error("Device selection cancelled")]
    UserCancelled,

    /// Failed to establish a connection to the scale.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// The connection to the scale was lost.
    #[error("Connection lost")]
    ConnectionLost,

    /// Neither the Weight Scale nor the Body Composition service pair
    /// resolved on the connected device. The device is not a supported
    /// scale; the transport is closed before this is surfaced.
    #[error("No supported weight service found on device")]
    ServiceNotFound,

    /// Operation requires a connection but the scale is not connected.
    #[error("Scale not connected")]
    NotConnected,

    /// A measurement store read or write failed. The in-flight
    /// measurement is not considered recorded.
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// CSV export failed.
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
