//! # doorlink
//!
//! Controller for serial-attached door access devices (card/PIN reader,
//! keypad, lock actuator and onboard event log).
//!
//! ## Features
//!
//! - Checksummed line protocol with strict reply/notification separation
//! - Credential hash reconciliation and bulk re-upload
//! - Event log drain
//! - Time-bounded public-open override driven from the keypad
//! - Drift-free heartbeats
//!
//! ## Quick Start
//!
//! ```no_run
//! use doorlink::{Controller, ControllerConfig, CredentialSet, FileOverrideSignal, StreamTransport};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> doorlink::Result<()> {
//!     let credentials = CredentialSet::load("cards.dat")?;
//!
//!     let mut controller = Controller::new(
//!         StreamTransport::from_port("/dev/ttyUSB0"),
//!         credentials,
//!         FileOverrideSignal::default(),
//!         ControllerConfig::default(),
//!     );
//!
//!     // Returns only on a fatal protocol error
//!     controller.run().await
//! }
//! ```

pub mod config;
pub mod controller;
pub mod drain;
pub mod error;
pub mod handshake;
pub mod link;
pub mod override_window;
pub mod sync;

// Re-exports
pub use config::ControllerConfig;
pub use controller::{Controller, LinkState, TickReport};
pub use error::{Error, Mismatch, Result};
pub use link::Link;
pub use override_window::{FileOverrideSignal, OverrideSignal, PublicOpenWindow};
pub use sync::{CredentialSync, SyncOutcome};

// Re-export types
pub use doorlink_core::{Command, Notification};
pub use doorlink_transport::{MockTransport, StreamTransport, Transport};
pub use doorlink_types::{Credential, CredentialSet, LogEntry};
