//! Type definitions for doorlink

pub mod credential;
pub mod error;
pub mod log_entry;

pub use credential::{Credential, CredentialSet};
pub use error::{Error, Result};
pub use log_entry::LogEntry;
