//! # doorlink-core
//!
//! Core protocol implementation for serial door-access devices.
//!
//! This crate provides the low-level protocol primitives:
//! - CRC-16/XMODEM line checksums
//! - The 6-character timestamp encoding used by heartbeats
//! - Line framing and classification of received frames
//! - Command definitions
//! - Protocol constants

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod frame;
pub mod timestamp;

pub use checksum::{checksum, Crc16};
pub use command::Command;
pub use error::{Error, Result};
pub use frame::Notification;
pub use timestamp::{decode_time, encode_time};
