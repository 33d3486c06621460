//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Link not open")]
    NotConnected,

    #[error("Link already open")]
    AlreadyConnected,

    /// TCP bridge did not accept the connection in time
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// No byte arrived before the read deadline
    #[error("Read timeout")]
    ReadTimeout,

    #[error("Link closed by remote")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Device node could not be opened or configured
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Endpoint that cannot be opened, e.g. a non UTF-8 node path
    #[error("Invalid endpoint: {0}")]
    InvalidAddress(String),
}
