//! Authorized credentials and the credential file loader

use std::fmt;
use std::fs;
use std::path::Path;

use doorlink_core::Crc16;
use tracing::debug;

use crate::error::{Error, Result};

/// Expected header fields of a credential file
pub const FILE_HEADER: [&str; 3] = ["card_id", "pin", "user_id"];

/// A card/PIN pair accepted by the door
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Credential {
    /// Card identifier, uppercased
    pub card_id: String,

    /// PIN entered on the keypad
    pub pin: String,
}

impl Credential {
    /// Create a credential, normalizing the card id to uppercase
    pub fn new(card_id: impl AsRef<str>, pin: impl Into<String>) -> Self {
        Self {
            card_id: card_id.as_ref().to_uppercase(),
            pin: pin.into(),
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.card_id, self.pin)
    }
}

/// Ordered credential set
///
/// Order is significant: it is the upload order and it feeds the rolling
/// credential hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    credentials: Vec<Credential>,
}

impl CredentialSet {
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    /// Load a credential file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed
    /// (see [`CredentialSet::parse`]).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let set = Self::parse(&contents)?;

        debug!(path = %path.display(), count = set.len(), "Loaded credentials");

        Ok(set)
    }

    /// Parse credential file contents
    ///
    /// # Format
    ///
    /// ```text
    /// card_id pin user_id
    /// 04a1b2c3 1234 alice
    /// 04D4E5F6 9876 bob
    /// ```
    ///
    /// The header line is mandatory. Every other non-blank line has exactly
    /// three whitespace-separated fields; `user_id` is not sent to the device.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the header is missing or wrong
    /// - [`Error::Parse`] if a record does not have three fields
    pub fn parse(contents: &str) -> Result<Self> {
        let mut lines = contents.lines();

        let header: Vec<&str> = lines
            .next()
            .map(|l| l.split_whitespace().collect())
            .unwrap_or_default();
        if header != FILE_HEADER {
            return Err(Error::Validation(format!(
                "Bad credential file header: {:?}",
                header
            )));
        }

        let mut credentials = Vec::new();
        for (index, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => continue,
                [card_id, pin, _user_id] => credentials.push(Credential::new(card_id, *pin)),
                _ => {
                    return Err(Error::Parse {
                        // 1-based, counting the header
                        line: index + 2,
                        message: format!("expected 3 fields, got {}", fields.len()),
                    });
                }
            }
        }

        Ok(Self { credentials })
    }

    /// Rolling CRC-16/XMODEM over the whole set
    ///
    /// One accumulator, seeded at zero, is fed `"{card_id} {pin}"` followed by
    /// a NUL byte for every credential in order. The device computes the same
    /// value over its store, so equal hashes mean equal sets.
    pub fn hash(&self) -> String {
        let mut crc = Crc16::new();
        for credential in &self.credentials {
            crc.update(credential.to_string().as_bytes());
            crc.update(&[0]);
        }
        crc.to_hex()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Credential> {
        self.credentials.iter()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

impl FromIterator<Credential> for CredentialSet {
    fn from_iter<I: IntoIterator<Item = Credential>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CredentialSet {
    type Item = &'a Credential;
    type IntoIter = std::slice::Iter<'a, Credential>;

    fn into_iter(self) -> Self::IntoIter {
        self.credentials.iter()
    }
}
