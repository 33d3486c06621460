//! Protocol command definitions

use std::fmt;

/// Commands sent from the controller to the device
///
/// The link reset marker `X` is not a command: it is written bare, without a
/// checksum, and never answered. See [`crate::constants::LINK_RESET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Claim device address 0 (`S0`)
    ClaimAddress,

    /// Liveness probe carrying an encoded timestamp (`P0<time>`)
    Heartbeat(String),

    /// Report the device credential hash (`K0`)
    ReportKeyHash,

    /// Erase the device credential store (`R0`)
    ResetKeys,

    /// Add one credential (`N0<card_id> <pin>`)
    AddKey { card_id: String, pin: String },

    /// Fetch the oldest log entry (`G0`)
    FetchLog,

    /// Clear the last fetched log entry (`C0`)
    ClearLog,

    /// Trigger the lock actuator (`U0`)
    Unlock,
}

impl Command {
    /// Encode the command payload (without checksum or terminator)
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlink_core::Command;
    ///
    /// assert_eq!(Command::ClaimAddress.encode(), "S0");
    /// let add = Command::AddKey { card_id: "04AB".into(), pin: "1234".into() };
    /// assert_eq!(add.encode(), "N004AB 1234");
    /// ```
    pub fn encode(&self) -> String {
        match self {
            Self::ClaimAddress => "S0".to_string(),
            Self::Heartbeat(time) => format!("P0{time}"),
            Self::ReportKeyHash => "K0".to_string(),
            Self::ResetKeys => "R0".to_string(),
            Self::AddKey { card_id, pin } => format!("N0{card_id} {pin}"),
            Self::FetchLog => "G0".to_string(),
            Self::ClearLog => "C0".to_string(),
            Self::Unlock => "U0".to_string(),
        }
    }

    /// Get command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClaimAddress => "CLAIM_ADDRESS",
            Self::Heartbeat(_) => "HEARTBEAT",
            Self::ReportKeyHash => "REPORT_KEY_HASH",
            Self::ResetKeys => "RESET_KEYS",
            Self::AddKey { .. } => "ADD_KEY",
            Self::FetchLog => "FETCH_LOG",
            Self::ClearLog => "CLEAR_LOG",
            Self::Unlock => "UNLOCK",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.encode())
    }
}

/// Expected reply bodies
pub mod reply {
    /// Generic acknowledgement
    pub const ACK: &str = "A0";

    /// Address claim accepted
    pub const ADDRESS_CLAIMED: &str = "S1";

    /// Prefix of a log entry reply; bare prefix means the log is empty
    pub const LOG_ENTRY_PREFIX: &str = "V0";

    /// Heartbeat echo for an encoded timestamp
    pub fn heartbeat_echo(time: &str) -> String {
        format!("P1{time}")
    }

    /// Key hash report for a 4-digit hash
    pub fn key_hash(hash: &str) -> String {
        format!("H0{hash}")
    }
}
