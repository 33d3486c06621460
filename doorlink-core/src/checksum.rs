//! Line checksum algorithm
//!
//! Every line on the wire carries a CRC-16/XMODEM of its payload:
//! 1. Polynomial 0x1021, initial value 0x0000
//! 2. No input or output reflection, no final xor
//! 3. Appended as 4 uppercase hex digits, zero-padded

use tracing::trace;

/// CRC-16/XMODEM generator polynomial
const POLYNOMIAL: u16 = 0x1021;

/// Incremental CRC-16/XMODEM accumulator
///
/// The same accumulator can be fed from several inputs in sequence; the
/// credential hash relies on this to fingerprint a whole credential set.
///
/// # Examples
///
/// ```
/// use doorlink_core::Crc16;
///
/// let mut crc = Crc16::new();
/// crc.update(b"1234");
/// crc.update(b"56789");
/// assert_eq!(crc.value(), 0x31C3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc16 {
    value: u16,
}

impl Crc16 {
    /// Create an accumulator seeded at zero
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Feed bytes into the accumulator
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.value ^= u16::from(byte) << 8;
            for _ in 0..8 {
                self.value = if self.value & 0x8000 != 0 {
                    (self.value << 1) ^ POLYNOMIAL
                } else {
                    self.value << 1
                };
            }
        }
    }

    /// Current accumulator value
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Current value as 4 uppercase hex digits
    pub fn to_hex(&self) -> String {
        format!("{:04X}", self.value)
    }
}

/// Calculate the CRC-16/XMODEM of a byte slice
pub fn calculate(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(data);
    crc.value()
}

/// Calculate the line trailer for a payload
///
/// # Examples
///
/// ```
/// use doorlink_core::checksum;
///
/// assert_eq!(checksum("123456789"), "31C3");
/// assert_eq!(checksum(""), "0000");
/// ```
pub fn checksum(payload: &str) -> String {
    let trailer = format!("{:04X}", calculate(payload.as_bytes()));

    trace!(payload = payload, checksum = %trailer, "Calculated checksum");

    trailer
}

/// Verify a line trailer against its payload
pub fn verify(payload: &str, trailer: &str) -> bool {
    checksum(payload) == trailer
}
