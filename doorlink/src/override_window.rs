//! Public-open override
//!
//! An operator can open the space to the public for a number of hours. While
//! the window is active, pressing `#` on the keypad unlocks the door without
//! a credential.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use doorlink_core::constants::SECS_PER_HOUR;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Default trigger file
pub const DEFAULT_OVERRIDE_PATH: &str = "/tmp/open-day";

/// Source of override requests
#[cfg_attr(test, mockall::automock)]
pub trait OverrideSignal: Send {
    /// Take a pending request, in hours; each request is returned once
    fn poll(&mut self) -> Result<Option<u32>>;
}

/// Override requested by dropping an hour count into a file
///
/// The file is deleted when read.
#[derive(Debug, Clone)]
pub struct FileOverrideSignal {
    path: PathBuf,
}

impl FileOverrideSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for FileOverrideSignal {
    fn default() -> Self {
        Self::new(DEFAULT_OVERRIDE_PATH)
    }
}

impl OverrideSignal for FileOverrideSignal {
    fn poll(&mut self) -> Result<Option<u32>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        fs::remove_file(&self.path)?;

        contents
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::InvalidOverride(format!("{:?}: {}", contents.trim(), e)))
    }
}

/// Time-bounded public-open state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublicOpenWindow {
    expires_at: Option<Instant>,
}

impl PublicOpenWindow {
    pub fn is_active(&self) -> bool {
        self.expires_at.is_some()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Open (or re-open) the window for `hours` from `now`
    ///
    /// A zero-hour request is ignored. Returns whether the window opened.
    pub fn open(&mut self, now: Instant, hours: u32) -> bool {
        if hours == 0 {
            warn!("Ignoring zero-hour override");
            return false;
        }

        self.expires_at = Some(now + Duration::from_secs(u64::from(hours) * SECS_PER_HOUR));
        info!("Opening space for {} hours", hours);
        true
    }

    /// Close the window if `now` has reached its expiry
    ///
    /// Returns whether the window closed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires_at) if now >= expires_at => {
                self.expires_at = None;
                info!("Closing space");
                true
            }
            _ => false,
        }
    }
}
