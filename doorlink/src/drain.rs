//! Event log drain
//!
//! Entries are fetched and acknowledged one at a time, oldest first. Any
//! failure aborts the drain; an entry is never cleared without having been
//! read.

use doorlink_core::{command::reply, Command};
use doorlink_types::LogEntry;
use tracing::info;

use crate::error::{Error, Mismatch, Result};
use crate::link::Link;

/// Fetch and clear device log entries until the log is empty
///
/// Each entry is reported as it is read and returned in device order.
///
/// # Errors
///
/// - [`Error::LogReadFailed`] if a fetch reply lacks the `V0` prefix
/// - [`Error::LogClearFailed`] if clearing an entry is not acknowledged
pub async fn drain(link: &mut Link) -> Result<Vec<LogEntry>> {
    let mut entries = Vec::new();

    loop {
        let body = link.do_command(&Command::FetchLog).await?;

        let Some(rest) = body.strip_prefix(reply::LOG_ENTRY_PREFIX) else {
            return Err(Error::LogReadFailed(Mismatch::new(
                format!("{}...", reply::LOG_ENTRY_PREFIX),
                body,
            )));
        };
        if rest.is_empty() {
            return Ok(entries);
        }

        let entry = LogEntry::new(rest);
        info!(entry = %entry, "Log event");
        entries.push(entry);

        link.expect(&Command::ClearLog, reply::ACK, Error::LogClearFailed)
            .await?;
    }
}
