//! Transport layer for the door link protocol
//!
//! Provides line-oriented byte transport to the device over a serial node or
//! a serial-over-TCP bridge, plus a scripted device for tests.

pub mod error;
pub mod mock;
pub mod stream;

pub use error::{Error, Result};
pub use mock::{MockHandle, MockTransport};
pub use stream::StreamTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for different link media
#[async_trait]
pub trait Transport: Send {
    /// Open the link
    async fn open(&mut self) -> Result<()>;

    /// Close the link
    async fn close(&mut self) -> Result<()>;

    /// Check if open
    fn is_open(&self) -> bool;

    /// Write raw bytes
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read one line, terminator included
    ///
    /// If the timeout expires after some bytes arrived, the partial line is
    /// returned without a terminator. If nothing arrived, fails with
    /// [`Error::ReadTimeout`].
    async fn read_line(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Number of received bytes that can be read without blocking
    async fn bytes_available(&mut self) -> Result<usize>;

    /// Drop everything currently received, returning the byte count
    async fn discard_input(&mut self) -> Result<usize>;

    /// Human-readable endpoint description
    fn describe(&self) -> String;
}
