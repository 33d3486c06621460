//! High-level error types

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Reply that did not match what the command requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: String,
    pub received: String,
}

impl Mismatch {
    pub fn new(expected: impl Into<String>, received: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            received: received.into(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {:?}, got {:?}", self.expected, self.received)
    }
}

/// Every variant is fatal to the run; nothing is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] doorlink_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] doorlink_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] doorlink_types::Error),

    #[error("Timeout waiting for response after {seconds}s")]
    TransportTimeout { seconds: u64 },

    #[error("Device not accepting address: {0}")]
    AddressClaimFailed(Mismatch),

    #[error("Machine does not answer heartbeat: {0}")]
    HeartbeatFailed(Mismatch),

    #[error("Device key reset failed: {0}")]
    KeyResetFailed(Mismatch),

    #[error("Device not accepting keys: {0}")]
    KeyUploadRejected(Mismatch),

    #[error("Key upload corrupt: {0}")]
    KeyUploadCorrupt(Mismatch),

    #[error("Failed to get log event: {0}")]
    LogReadFailed(Mismatch),

    #[error("Error clearing event log: {0}")]
    LogClearFailed(Mismatch),

    #[error("Invalid override signal: {0}")]
    InvalidOverride(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if the frame checksum failed
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, Self::Core(doorlink_core::Error::ChecksumMismatch { .. }))
    }

    /// Check if the device rejected or garbled an expected reply
    pub fn is_reply_mismatch(&self) -> bool {
        self.mismatch().is_some()
    }

    /// The offending reply, for reply mismatch errors
    pub fn mismatch(&self) -> Option<&Mismatch> {
        match self {
            Self::AddressClaimFailed(m)
            | Self::HeartbeatFailed(m)
            | Self::KeyResetFailed(m)
            | Self::KeyUploadRejected(m)
            | Self::KeyUploadCorrupt(m)
            | Self::LogReadFailed(m)
            | Self::LogClearFailed(m) => Some(m),
            _ => None,
        }
    }
}
