//! Device audit log entries

use std::fmt;

/// One entry drained from the device event log
///
/// The entry text is whatever the device reported after the `V0` prefix; its
/// layout is firmware-defined and kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Entry text without the reply prefix
    pub raw: String,
}

impl LogEntry {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
