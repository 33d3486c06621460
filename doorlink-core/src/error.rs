//! Error types for doorlink-core

/// Result type alias for doorlink-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Line trailer does not match the checksum of its body
    #[error("Checksum mismatch: expected {expected}, received {received}")]
    ChecksumMismatch {
        expected: String,
        received: String,
    },

    /// Character outside the 64-symbol timestamp alphabet
    #[error("Invalid encoding: character {character:?} at position {position}")]
    InvalidEncoding {
        position: usize,
        character: char,
    },

    /// Encoded timestamp longer than the protocol allows
    #[error("Invalid encoding: {0} characters (max: 6)")]
    InvalidEncodingLength(usize),
}
