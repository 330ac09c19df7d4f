//! Crate-wide error types
//!
//! Validation and persistence failures are reported only to the originating
//! caller and never terminate a connection; `Io`/`Codec` cover the transport
//! edges.

use crate::persistence::StoreError;

/// Error type for relay operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Inbound message failed validation (missing or out-of-range fields)
    #[error("{0}")]
    Validation(String),

    /// The persistence port rejected the report
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Transport I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wire encoding failure
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Convenience result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Message text reported back to the caller in the failed ack and the
    /// `error` event.
    pub fn caller_message(&self) -> String {
        self.to_string()
    }
}
