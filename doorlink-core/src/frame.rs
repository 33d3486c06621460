//! Line framing and classification of received frames
//!
//! # Frame Structure
//!
//! ```text
//! ┌──────────────────────┬─────────────┬────────────┐
//! │        Body          │  Checksum   │ Terminator │
//! │   N ASCII chars      │ 4 hex chars │    '\n'    │
//! └──────────────────────┴─────────────┴────────────┘
//! ```
//!
//! The checksum is CRC-16/XMODEM of the body. Received lines are sorted into
//! synchronous replies and unsolicited notifications by their first body
//! character.

use tracing::{trace, warn};

use crate::{
    checksum::checksum,
    constants::{notifications, CHECKSUM_LEN, COMMENT_MARKER, MIN_FRAME_LEN, TERMINATOR},
    error::{Error, Result},
};

/// A classified inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Device log has unread entries
    EventPending,

    /// A key was pressed on the device keypad
    KeypadDigit(char),

    /// Synchronous reply body to the last command
    Reply(String),

    /// Comment, blank or truncated line
    Noise,
}

/// Encode an outgoing line: payload, checksum, terminator
///
/// # Examples
///
/// ```
/// use doorlink_core::frame::encode_line;
///
/// assert_eq!(encode_line("123456789"), "12345678931C3\n");
/// ```
pub fn encode_line(payload: &str) -> String {
    let mut line = String::with_capacity(payload.len() + MIN_FRAME_LEN);
    line.push_str(payload);
    line.push_str(&checksum(payload));
    line.push(TERMINATOR);
    line
}

/// Classify one received line
///
/// The trailing terminator (and a preceding carriage return) is optional.
///
/// # Errors
///
/// Returns [`Error::ChecksumMismatch`] if the trailer does not match the body.
/// A mismatch is fatal to the exchange: the line must not be mistaken for a
/// reply.
pub fn classify(line: &str) -> Result<Notification> {
    let line = line
        .strip_suffix(TERMINATOR)
        .unwrap_or(line)
        .trim_end_matches('\r');

    let len = line.chars().count();
    if len < MIN_FRAME_LEN || line.starts_with(COMMENT_MARKER) {
        trace!(line = line, "Ignoring noise");
        return Ok(Notification::Noise);
    }

    // Split on a char boundary; line noise is not guaranteed to be ASCII.
    let split = line
        .char_indices()
        .nth(len - CHECKSUM_LEN)
        .map_or(line.len(), |(i, _)| i);
    let (body, trailer) = line.split_at(split);

    let expected = checksum(body);
    if trailer != expected {
        return Err(Error::ChecksumMismatch {
            expected,
            received: trailer.to_string(),
        });
    }

    let mut chars = body.chars();
    let notification = match chars.next() {
        Some(notifications::EVENT_PENDING) => Notification::EventPending,
        Some(notifications::KEYPAD) => match chars.nth(notifications::KEYPAD_KEY_INDEX - 1) {
            Some(key) => Notification::KeypadDigit(key),
            None => {
                warn!(body = body, "Keypad frame without key");
                Notification::Noise
            }
        },
        _ => Notification::Reply(body.to_string()),
    };

    trace!(body = body, ?notification, "Classified frame");

    Ok(notification)
}
